use bucketdrop_core::AppError;
use bucketdrop_storage::StorageError;
use thiserror::Error;

use crate::identity::IdentityError;

/// Errors that stop a batch from starting.
///
/// Per-file transfer failures never surface here; they are recorded on the
/// file's history record instead.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No files selected")]
    EmptyBatch,

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Upload history is no longer available")]
    LedgerClosed,
}

/// Errors from fetching a listing page.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Listing failed: {0}")]
    Storage(#[from] StorageError),
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::EmptyBatch => AppError::EmptyBatch,
            UploadError::Identity(e) => e.into(),
            UploadError::LedgerClosed => AppError::Internal(UploadError::LedgerClosed.to_string()),
        }
    }
}

impl From<ListingError> for AppError {
    fn from(err: ListingError) -> Self {
        match err {
            ListingError::Identity(e) => e.into(),
            ListingError::Storage(e) => AppError::ListingFailed(e.to_string()),
        }
    }
}
