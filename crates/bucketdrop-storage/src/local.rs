use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bucketdrop_core::Visibility;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::keys::{scoped_key, validate_key};
use crate::paging::paginate;
use crate::traits::{
    ListOptions, ListResult, ObjectStorage, ObjectSummary, PutOptions, PutResult, StorageError,
    StorageResult,
};
use crate::StorageBackend;

const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Uploads are written here first and renamed into place once synced.
/// It sits beside the level roots, so listings never see half-written files.
const STAGING_DIR: &str = ".incoming";

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    chunk_size: usize,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "./bucketdrop-data")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    /// Write in chunks of `chunk_size` bytes, reporting progress after each.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Convert a physical key to a filesystem path with security validation
    fn key_to_path(&self, physical_key: &str) -> StorageResult<PathBuf> {
        validate_key(physical_key)?;

        let path = self.base_path.join(physical_key);

        if let (Ok(canonical), Ok(base_canonical)) =
            (path.canonicalize(), self.base_path.canonicalize())
        {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
        self.base_path
            .join(STAGING_DIR)
            .join(format!("{}-{}.partial", std::process::id(), seq))
    }

    async fn write_staged(
        &self,
        staged: &Path,
        data: &Bytes,
        options: &PutOptions,
    ) -> StorageResult<()> {
        let total = data.len() as u64;
        let mut file = fs::File::create(staged).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create file {}: {}",
                staged.display(),
                e
            ))
        })?;

        if data.is_empty() {
            options.report_progress(0, 0);
        }
        let mut loaded = 0u64;
        for chunk in data.chunks(self.chunk_size) {
            file.write_all(chunk).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write file {}: {}",
                    staged.display(),
                    e
                ))
            })?;
            loaded += chunk.len() as u64;
            options.report_progress(loaded, total);
        }

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", staged.display(), e))
        })
    }

    /// Collect every file below the level root as (logical key, summary).
    async fn walk_level(&self, visibility: Visibility) -> StorageResult<Vec<ObjectSummary>> {
        let level_root = self
            .base_path
            .join(visibility.level_prefix().trim_end_matches('/'));

        if !fs::try_exists(&level_root).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut objects = Vec::new();
        let mut pending = vec![level_root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await.map_err(|e| {
                StorageError::ListFailed(format!("Failed to read {}: {}", dir.display(), e))
            })?;

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let metadata = entry.metadata().await?;

                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Ok(relative) = path.strip_prefix(&level_root) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");

                let last_modified = metadata
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());

                objects.push(ObjectSummary {
                    key,
                    size: Some(metadata.len()),
                    last_modified,
                });
            }
        }

        Ok(objects)
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn put(&self, key: &str, data: Bytes, options: PutOptions) -> StorageResult<PutResult> {
        validate_key(key)?;
        let physical = scoped_key(options.visibility, key);
        let path = self.key_to_path(&physical)?;
        let total = data.len() as u64;

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let staged = self.staging_path();
        self.ensure_parent_dir(&staged).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to prepare staging directory: {}", e))
        })?;

        // The previous object under this key stays intact until the rename.
        let written = match self.write_staged(&staged, &data, &options).await {
            Ok(()) => fs::rename(&staged, &path).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to move upload into {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&staged).await {
                tracing::debug!(
                    path = %staged.display(),
                    error = %cleanup,
                    "Staged upload not removed"
                );
            }
            return Err(e);
        }

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = total,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(PutResult {
            key: key.to_string(),
        })
    }

    async fn list(&self, prefix: &str, options: ListOptions) -> StorageResult<ListResult> {
        let start = std::time::Instant::now();

        let matching: Vec<ObjectSummary> = self
            .walk_level(options.visibility)
            .await?
            .into_iter()
            .filter(|object| object.key.starts_with(prefix))
            .collect();

        let page = paginate(matching, &options);

        tracing::debug!(
            prefix = %prefix,
            returned = page.results.len(),
            has_more = page.next_token.is_some(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage list successful"
        );

        Ok(page)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
