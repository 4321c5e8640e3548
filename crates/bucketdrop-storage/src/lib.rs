//! Bucketdrop Storage Library
//!
//! This crate provides the object-storage capability used by the upload and
//! listing services, together with in-memory, local filesystem and S3
//! implementations.
//!
//! # Storage key format
//!
//! Callers address objects by a logical key, `{namespace}/{filename}`. Each
//! backend stores the object under the root of its access level:
//!
//! - **Public**: `public/{namespace}/{filename}`
//! - **Private**: `private/{namespace}/{filename}`
//!
//! Listing results carry the logical key again (level root removed). Keys
//! must not contain `..` segments or a leading `/`. Key handling lives in the
//! `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
pub(crate) mod paging;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use bucketdrop_core::{StorageBackend, Visibility};
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{
    ListOptions, ListResult, ObjectStorage, ObjectSummary, ProgressCallback, PutOptions,
    PutResult, StorageError, StorageResult,
};
