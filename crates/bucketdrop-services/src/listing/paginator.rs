use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use bucketdrop_core::constants::{LISTING_DISPLAY_LIMIT, LISTING_MAX_KEYS};
use bucketdrop_core::{
    size_label, Config, ContinuationToken, LoadMoreMode, StoredObjectEntry, Visibility,
};
use bucketdrop_storage::keys::{basename, namespace_prefix};
use bucketdrop_storage::{ListOptions, ObjectStorage};
use serde::Serialize;

use crate::error::ListingError;
use crate::identity::{resolve_namespace, IdentityProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginatorOptions {
    /// Page size requested from storage.
    pub max_keys: usize,
    /// Entries kept from each page after sorting.
    pub display_limit: usize,
    pub mode: LoadMoreMode,
    pub visibility: Visibility,
}

impl Default for PaginatorOptions {
    fn default() -> Self {
        Self {
            max_keys: LISTING_MAX_KEYS,
            display_limit: LISTING_DISPLAY_LIMIT,
            mode: LoadMoreMode::Append,
            visibility: Visibility::Public,
        }
    }
}

impl From<&Config> for PaginatorOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_keys: config.listing_max_keys(),
            display_limit: config.listing_display_limit(),
            mode: config.load_more_mode(),
            visibility: config.upload_visibility(),
        }
    }
}

/// One transformed page of the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingPage {
    /// Newest first, at most `display_limit` entries.
    pub entries: Vec<StoredObjectEntry>,
    pub next_token: Option<ContinuationToken>,
}

/// What a `refresh` or `load_more` call did.
#[derive(Debug)]
pub enum LoadOutcome {
    /// A page was fetched and applied to the visible list.
    Loaded(ListingPage),
    /// The fetch failed; the visible list and token were cleared.
    Failed(ListingError),
    /// There is no continuation token left.
    Exhausted,
    /// Another load is still in flight.
    Busy,
}

#[derive(Default)]
struct ListingState {
    entries: Vec<StoredObjectEntry>,
    next_token: Option<ContinuationToken>,
    last_error: Option<String>,
    activated: bool,
}

/// Clears the in-flight flag when the load finishes, even on cancellation.
struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Stateful view over the namespace listing.
///
/// Holds the visible entries and the continuation token for the next page.
/// At most one load runs at a time; overlapping calls get
/// [`LoadOutcome::Busy`].
pub struct FileListingPaginator {
    storage: Arc<dyn ObjectStorage>,
    identity: Arc<dyn IdentityProvider>,
    options: PaginatorOptions,
    state: Mutex<ListingState>,
    loading: AtomicBool,
}

impl FileListingPaginator {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        identity: Arc<dyn IdentityProvider>,
        options: PaginatorOptions,
    ) -> Self {
        Self {
            storage,
            identity,
            options,
            state: Mutex::new(ListingState::default()),
            loading: AtomicBool::new(false),
        }
    }

    /// Fetch and transform one page without touching the visible list.
    ///
    /// Keys are reduced to their basename, entries are sorted newest first
    /// (ties keep the order storage returned) and truncated to
    /// `display_limit`. The storage token is passed through unchanged.
    #[tracing::instrument(skip(self), fields(has_token = token.is_some()))]
    pub async fn load_page(
        &self,
        token: Option<ContinuationToken>,
    ) -> Result<ListingPage, ListingError> {
        let namespace = resolve_namespace(self.identity.as_ref()).await?;
        let prefix = namespace_prefix(&namespace);

        let options = ListOptions {
            max_keys: self.options.max_keys,
            continuation_token: token,
            visibility: self.options.visibility,
        };
        let result = self.storage.list(&prefix, options).await?;

        let mut entries: Vec<StoredObjectEntry> = result
            .results
            .into_iter()
            .map(|summary| StoredObjectEntry {
                key: basename(&summary.key).to_string(),
                size_label: size_label(summary.size),
                last_modified: summary.last_modified,
            })
            .collect();
        entries.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        entries.truncate(self.options.display_limit);

        tracing::debug!(
            count = entries.len(),
            has_more = result.next_token.is_some(),
            "Listing page loaded"
        );

        Ok(ListingPage {
            entries,
            next_token: result.next_token,
        })
    }

    /// Load the first page once. Later calls return `None` and do nothing.
    ///
    /// A call that finds another load in flight returns `Some(Busy)` and does
    /// not count as the initial load.
    pub async fn activate(&self) -> Option<LoadOutcome> {
        if self.lock_state().activated {
            return None;
        }
        let Some(_guard) = self.begin_load() else {
            return Some(LoadOutcome::Busy);
        };
        {
            let mut state = self.lock_state();
            if state.activated {
                return None;
            }
            state.activated = true;
        }
        let outcome = self.load_page(None).await;
        Some(self.apply(outcome, LoadMoreMode::Replace))
    }

    /// Reload the first page, replacing the visible list.
    pub async fn refresh(&self) -> LoadOutcome {
        let Some(_guard) = self.begin_load() else {
            return LoadOutcome::Busy;
        };
        let outcome = self.load_page(None).await;
        self.apply(outcome, LoadMoreMode::Replace)
    }

    /// Fetch the page after the current token.
    ///
    /// In `Append` mode the new entries go after the visible ones; in
    /// `Replace` mode they take their place.
    pub async fn load_more(&self) -> LoadOutcome {
        let Some(_guard) = self.begin_load() else {
            return LoadOutcome::Busy;
        };
        let Some(token) = self.next_token() else {
            return LoadOutcome::Exhausted;
        };
        let outcome = self.load_page(Some(token)).await;
        self.apply(outcome, self.options.mode)
    }

    pub fn entries(&self) -> Vec<StoredObjectEntry> {
        self.lock_state().entries.clone()
    }

    pub fn next_token(&self) -> Option<ContinuationToken> {
        self.lock_state().next_token.clone()
    }

    pub fn has_more(&self) -> bool {
        self.lock_state().next_token.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Message of the most recent failed load, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        self.lock_state().last_error.clone()
    }

    fn begin_load(&self) -> Option<LoadingGuard<'_>> {
        self.loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LoadingGuard(&self.loading))
    }

    fn apply(&self, outcome: Result<ListingPage, ListingError>, mode: LoadMoreMode) -> LoadOutcome {
        let mut state = self.lock_state();
        match outcome {
            Ok(page) => {
                match mode {
                    LoadMoreMode::Append => state.entries.extend(page.entries.iter().cloned()),
                    LoadMoreMode::Replace => state.entries = page.entries.clone(),
                }
                state.next_token = page.next_token.clone();
                state.last_error = None;
                LoadOutcome::Loaded(page)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to list stored files");
                state.entries.clear();
                state.next_token = None;
                state.last_error = Some(e.to_string());
                LoadOutcome::Failed(e)
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ListingState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
