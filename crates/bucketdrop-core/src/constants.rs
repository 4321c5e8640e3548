//! Shared constants.

/// Upper bound on transfers running at once within a single batch.
pub const DEFAULT_MAX_CONCURRENT_UPLOADS: usize = 4;

/// Largest page the object store accepts for one listing call.
pub const LISTING_MAX_KEYS: usize = 1000;

/// Number of stored objects shown per listing page.
pub const LISTING_DISPLAY_LIMIT: usize = 30;

/// Label shown for listed objects whose size is missing or zero.
pub const UNKNOWN_SIZE_LABEL: &str = "Unknown Size";

/// Content type used when a file's type cannot be guessed.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Default root for the local filesystem backend.
pub const DEFAULT_LOCAL_STORAGE_PATH: &str = "./bucketdrop-data";
