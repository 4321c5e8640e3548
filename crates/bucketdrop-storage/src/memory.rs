use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use bucketdrop_core::Visibility;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::keys::{scoped_key, unscoped_key, validate_key};
use crate::paging::paginate;
use crate::traits::{
    ListOptions, ListResult, ObjectStorage, ObjectSummary, PutOptions, PutResult, StorageError,
    StorageResult,
};
use crate::StorageBackend;

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
    last_modified: DateTime<Utc>,
}

/// In-process storage backed by a sorted map.
///
/// Progress is reported once per `chunk_size` bytes, yielding to the runtime
/// between chunks so concurrent transfers interleave.
#[derive(Clone)]
pub struct MemoryStorage {
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
    chunk_size: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Store an object with an explicit modification time, bypassing `put`.
    pub fn insert(
        &self,
        visibility: Visibility,
        key: &str,
        data: impl Into<Bytes>,
        last_modified: DateTime<Utc>,
    ) -> StorageResult<()> {
        validate_key(key)?;
        let mut objects = self
            .objects
            .write()
            .map_err(|_| StorageError::BackendError("memory storage lock poisoned".to_string()))?;
        objects.insert(
            scoped_key(visibility, key),
            StoredObject {
                data: data.into(),
                content_type: bucketdrop_core::constants::DEFAULT_MIME_TYPE.to_string(),
                last_modified,
            },
        );
        Ok(())
    }

    /// Fetch the bytes stored under a logical key.
    pub fn get(&self, visibility: Visibility, key: &str) -> Option<Bytes> {
        self.objects
            .read()
            .ok()?
            .get(&scoped_key(visibility, key))
            .map(|object| object.data.clone())
    }

    /// Content type recorded for a logical key.
    pub fn content_type(&self, visibility: Visibility, key: &str) -> Option<String> {
        self.objects
            .read()
            .ok()?
            .get(&scoped_key(visibility, key))
            .map(|object| object.content_type.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put(&self, key: &str, data: Bytes, options: PutOptions) -> StorageResult<PutResult> {
        validate_key(key)?;

        let total = data.len() as u64;
        if total == 0 {
            options.report_progress(0, 0);
        }
        let mut loaded = 0u64;
        while loaded < total {
            loaded = (loaded + self.chunk_size as u64).min(total);
            options.report_progress(loaded, total);
            tokio::task::yield_now().await;
        }

        let mut objects = self
            .objects
            .write()
            .map_err(|_| StorageError::UploadFailed("memory storage lock poisoned".to_string()))?;
        objects.insert(
            scoped_key(options.visibility, key),
            StoredObject {
                data,
                content_type: options.content_type.clone(),
                last_modified: Utc::now(),
            },
        );

        tracing::debug!(key = %key, size_bytes = total, "Memory storage put successful");

        Ok(PutResult {
            key: key.to_string(),
        })
    }

    async fn list(&self, prefix: &str, options: ListOptions) -> StorageResult<ListResult> {
        let objects = self
            .objects
            .read()
            .map_err(|_| StorageError::ListFailed("memory storage lock poisoned".to_string()))?;

        let matching: Vec<ObjectSummary> = objects
            .iter()
            .filter_map(|(physical, object)| {
                let key = unscoped_key(options.visibility, physical)?;
                key.starts_with(prefix).then(|| ObjectSummary {
                    key: key.to_string(),
                    size: Some(object.data.len() as u64),
                    last_modified: object.last_modified,
                })
            })
            .collect();

        Ok(paginate(matching, &options))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
