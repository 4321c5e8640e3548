//! Shared key handling for storage backends.
//!
//! Logical key format: `{namespace}/{filename}`. Backends store it under the
//! root of the access level, e.g. `public/{namespace}/{filename}`.

use bucketdrop_core::Visibility;

use crate::traits::{StorageError, StorageResult};

/// Logical key for a file uploaded into `namespace`.
///
/// Uploading two files with the same name into one namespace targets the same
/// key; the later upload overwrites the earlier one.
pub fn object_key(namespace: &str, filename: &str) -> String {
    format!("{}/{}", namespace, filename)
}

/// Listing prefix covering every object in `namespace`.
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{}/", namespace)
}

/// Reject keys that could escape the storage root.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains invalid characters: {}",
            key
        )));
    }
    Ok(())
}

/// Physical key of a logical key stored at the given access level.
pub fn scoped_key(visibility: Visibility, key: &str) -> String {
    format!("{}{}", visibility.level_prefix(), key)
}

/// Logical key of a physical key, or `None` when it belongs to another level.
pub fn unscoped_key(visibility: Visibility, physical: &str) -> Option<&str> {
    physical.strip_prefix(visibility.level_prefix())
}

/// Basename of a key: everything after the last `/`.
pub fn basename(key: &str) -> &str {
    match key.rfind('/') {
        Some(idx) => &key[idx + 1..],
        None => key,
    }
}
