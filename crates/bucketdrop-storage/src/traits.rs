//! Object storage abstraction trait
//!
//! This module defines the `ObjectStorage` trait that all storage backends
//! implement, along with the typed request and response shapes of its two
//! operations.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bucketdrop_core::{ContinuationToken, StorageBackend, Visibility};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("List failed: {0}")]
    ListFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Invalid continuation token: {0}")]
    InvalidToken(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Callback for transfer progress.
///
/// Invoked with the number of bytes sent so far and the total size. It is
/// called from inside the transfer and must not block. `loaded == total` means
/// every byte was sent, not that the object is stored; only a successful
/// `put` result means that.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, loaded: u64, total: u64);
}

impl<F> ProgressCallback for F
where
    F: Fn(u64, u64) + Send + Sync,
{
    fn on_progress(&self, loaded: u64, total: u64) {
        self(loaded, total)
    }
}

/// Options for a single `put`.
#[derive(Clone)]
pub struct PutOptions {
    pub content_type: String,
    pub visibility: Visibility,
    pub on_progress: Option<Arc<dyn ProgressCallback>>,
}

impl PutOptions {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            visibility: Visibility::default(),
            on_progress: None,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Forward a progress update to the callback, if any.
    pub fn report_progress(&self, loaded: u64, total: u64) {
        if let Some(callback) = &self.on_progress {
            callback.on_progress(loaded, total);
        }
    }
}

impl fmt::Debug for PutOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutOptions")
            .field("content_type", &self.content_type)
            .field("visibility", &self.visibility)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Outcome of a successful `put`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutResult {
    /// Logical key the object was stored under.
    pub key: String,
}

/// Options for a `list` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub max_keys: usize,
    pub continuation_token: Option<ContinuationToken>,
    pub visibility: Visibility,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            max_keys: bucketdrop_core::constants::LISTING_MAX_KEYS,
            continuation_token: None,
            visibility: Visibility::default(),
        }
    }
}

/// One stored object as reported by `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Logical key, level root removed.
    pub key: String,
    pub size: Option<u64>,
    pub last_modified: DateTime<Utc>,
}

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListResult {
    pub results: Vec<ObjectSummary>,
    pub next_token: Option<ContinuationToken>,
}

/// Object storage capability
///
/// The upload tracker and the listing paginator only ever talk to storage
/// through this trait, so any backend (S3, local filesystem, in-memory) can be
/// plugged in.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `data` under `key`, reporting progress through `options.on_progress`.
    async fn put(&self, key: &str, data: Bytes, options: PutOptions) -> StorageResult<PutResult>;

    /// List objects whose logical key starts with `prefix`.
    ///
    /// Returns at most `options.max_keys` entries and a token when more remain.
    async fn list(&self, prefix: &str, options: ListOptions) -> StorageResult<ListResult>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

impl From<StorageError> for bucketdrop_core::AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ConfigError(msg) => bucketdrop_core::AppError::Config(msg),
            StorageError::InvalidKey(msg) => bucketdrop_core::AppError::InvalidInput(msg),
            other => bucketdrop_core::AppError::Storage(other.to_string()),
        }
    }
}
