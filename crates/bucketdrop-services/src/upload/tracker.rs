use std::sync::Arc;
use std::time::Instant;

use bucketdrop_core::constants::{DEFAULT_MAX_CONCURRENT_UPLOADS, DEFAULT_MIME_TYPE};
use bucketdrop_core::{Config, SelectedFile, UploadRecord, Visibility};
use bucketdrop_storage::keys::object_key;
use bucketdrop_storage::{ObjectStorage, PutOptions};
use tokio::sync::{broadcast, watch, Semaphore};
use tokio::task::JoinHandle;

use super::ledger::{HistoryLedger, RecordUpdate};
use super::types::{BatchOutcome, FileSource, RawFile};
use crate::error::UploadError;
use crate::identity::{resolve_namespace, IdentityProvider};

/// Tuning for an [`UploadBatchTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerOptions {
    pub visibility: Visibility,
    pub max_concurrent_uploads: usize,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            visibility: Visibility::Public,
            max_concurrent_uploads: DEFAULT_MAX_CONCURRENT_UPLOADS,
        }
    }
}

impl From<&Config> for TrackerOptions {
    fn from(config: &Config) -> Self {
        Self {
            visibility: config.upload_visibility(),
            max_concurrent_uploads: config.max_concurrent_uploads(),
        }
    }
}

struct PendingFile {
    selected: SelectedFile,
    source: FileSource,
}

/// Owns the pending batch and the session's upload history.
pub struct UploadBatchTracker {
    storage: Arc<dyn ObjectStorage>,
    identity: Arc<dyn IdentityProvider>,
    ledger: HistoryLedger,
    pending: Vec<PendingFile>,
    options: TrackerOptions,
}

impl UploadBatchTracker {
    /// Create a tracker with an empty batch and history.
    ///
    /// Spawns the history ledger, so it must be called inside a Tokio runtime.
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        identity: Arc<dyn IdentityProvider>,
        options: TrackerOptions,
    ) -> Self {
        Self {
            storage,
            identity,
            ledger: HistoryLedger::spawn(),
            pending: Vec::new(),
            options,
        }
    }

    /// Replace the pending batch with `files`.
    ///
    /// Each file gets its selection position as id. The history is untouched.
    pub fn select_files(&mut self, files: Vec<RawFile>) -> Vec<SelectedFile> {
        self.pending = files
            .into_iter()
            .enumerate()
            .map(|(index, file)| PendingFile {
                selected: SelectedFile {
                    id: index as u32,
                    name: file.name,
                    size_bytes: file.size_bytes,
                    mime_type: file.mime_type,
                },
                source: file.source,
            })
            .collect();

        tracing::debug!(count = self.pending.len(), "Files selected");
        self.pending()
    }

    /// Files waiting to be uploaded, in selection order.
    pub fn pending(&self) -> Vec<SelectedFile> {
        self.pending.iter().map(|p| p.selected.clone()).collect()
    }

    /// Drop the file at `index` from the pending batch.
    ///
    /// Out-of-range indices are ignored. Remaining files keep their ids.
    pub fn remove_from_batch(&mut self, index: usize) {
        if index < self.pending.len() {
            let removed = self.pending.remove(index);
            tracing::debug!(index, file = %removed.selected.name, "Removed file from batch");
        }
    }

    /// Upload every pending file.
    ///
    /// Appends one `InProgress` record per file in selection order, then runs
    /// the transfers with at most `max_concurrent_uploads` in flight. Returns
    /// once every transfer has settled; the pending batch is cleared only then.
    /// Individual transfer failures are recorded on their history record and
    /// do not fail the batch.
    #[tracing::instrument(skip(self), fields(batch.size = self.pending.len()))]
    pub async fn start_upload(&mut self) -> Result<BatchOutcome, UploadError> {
        if self.pending.is_empty() {
            tracing::warn!("Upload requested with no files selected");
            return Err(UploadError::EmptyBatch);
        }

        let namespace = resolve_namespace(self.identity.as_ref()).await.map_err(|e| {
            tracing::error!(error = %e, "Could not resolve upload namespace");
            UploadError::from(e)
        })?;

        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_uploads.max(1)));
        let mut transfers: Vec<(u64, JoinHandle<()>)> = Vec::with_capacity(self.pending.len());

        for file in &self.pending {
            let key = object_key(&namespace, &file.selected.name);
            let id = self
                .ledger
                .append(
                    file.selected.name.clone(),
                    file.selected.mime_type.clone(),
                    file.selected.size_bytes,
                )
                .await?;

            let content_type = if file.selected.mime_type.is_empty() {
                DEFAULT_MIME_TYPE.to_string()
            } else {
                file.selected.mime_type.clone()
            };
            let options = PutOptions::new(content_type)
                .with_visibility(self.options.visibility)
                .with_progress(self.ledger.progress_callback(id));

            let handle = tokio::spawn(transfer(
                Arc::clone(&self.storage),
                self.ledger.clone(),
                Arc::clone(&semaphore),
                id,
                key,
                file.source.clone(),
                options,
            ));
            transfers.push((id, handle));
        }

        let batch_ids: Vec<u64> = transfers.iter().map(|(id, _)| *id).collect();
        for (id, handle) in transfers {
            if let Err(e) = handle.await {
                tracing::error!(record_id = id, error = %e, "Upload task aborted");
                self.ledger.fail(id, format!("upload task aborted: {e}"));
            }
        }

        self.ledger.flush().await?;
        self.pending.clear();

        let records: Vec<UploadRecord> = self
            .ledger
            .snapshot()
            .into_iter()
            .filter(|r| batch_ids.contains(&r.id))
            .collect();
        let outcome = BatchOutcome { namespace, records };

        tracing::info!(
            succeeded = outcome.succeeded(),
            failed = outcome.failures().len(),
            duration_ms = start.elapsed().as_millis(),
            "Upload batch finished"
        );

        Ok(outcome)
    }

    /// Every record created during this session, in append order.
    pub fn history(&self) -> Vec<UploadRecord> {
        self.ledger.snapshot()
    }

    /// Snapshot stream of the history.
    pub fn subscribe(&self) -> watch::Receiver<Vec<UploadRecord>> {
        self.ledger.watch()
    }

    /// Per-record change events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<RecordUpdate> {
        self.ledger.subscribe()
    }
}

#[tracing::instrument(skip(storage, ledger, semaphore, source, options), fields(record.id = id))]
async fn transfer(
    storage: Arc<dyn ObjectStorage>,
    ledger: HistoryLedger,
    semaphore: Arc<Semaphore>,
    id: u64,
    key: String,
    source: FileSource,
    options: PutOptions,
) {
    let _permit = match semaphore.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            ledger.fail(id, e.to_string());
            return;
        }
    };

    let data = match source.load().await {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(key = %key, error = %e, "Failed to read file for upload");
            ledger.fail(id, format!("failed to read file: {e}"));
            return;
        }
    };

    let size = data.len();
    match storage.put(&key, data, options).await {
        Ok(result) => {
            tracing::info!(key = %result.key, size_bytes = size, "File uploaded");
            ledger.complete(id);
        }
        Err(e) => {
            tracing::error!(key = %key, error = %e, "Upload failed");
            ledger.fail(id, e.to_string());
        }
    }
}
