//! Bucketdrop Core Library
//!
//! This crate provides the domain models, error types, configuration and
//! formatting helpers shared by the storage backends, the upload/listing
//! services and the CLI.

pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, UploaderConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use format::{format_bytes, size_label};
pub use models::{
    progress_percentage, ContinuationToken, LoadMoreMode, SelectedFile, StoredObjectEntry,
    UploadRecord, UploadStatus,
};
pub use storage_types::{StorageBackend, Visibility};
