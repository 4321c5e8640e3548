use std::sync::Arc;

use async_trait::async_trait;
use bucketdrop_core::{ContinuationToken, Visibility};
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::{
    Attribute, Attributes, ObjectMeta, ObjectStore, ObjectStoreExt, PutPayload,
    PutOptions as StorePutOptions,
};

use crate::keys::{scoped_key, unscoped_key, validate_key};
use crate::traits::{
    ListOptions, ListResult, ObjectStorage, ObjectSummary, PutOptions, PutResult, StorageError,
    StorageResult,
};
use crate::StorageBackend;

/// Objects up to this size go up in a single request; larger ones use a
/// multipart upload with one progress update per part. S3 requires every part
/// but the last to be at least 5 MiB.
const MULTIPART_PART_SIZE: usize = 8 * 1024 * 1024;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    part_size: usize,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        // Credentials come from the standard AWS environment variables.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self::from_store(Arc::new(store), bucket))
    }

    /// Wrap an already configured store, e.g. an in-memory one.
    pub fn from_store(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        S3Storage {
            store,
            bucket: bucket.into(),
            part_size: MULTIPART_PART_SIZE,
        }
    }

    /// Objects larger than `part_size` are sent as multipart uploads.
    pub fn with_part_size(mut self, part_size: usize) -> Self {
        self.part_size = part_size.max(1);
        self
    }

    async fn put_single(
        &self,
        location: &Path,
        data: Bytes,
        options: &PutOptions,
    ) -> Result<(), object_store::Error> {
        let total = data.len() as u64;
        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, options.content_type.clone().into());

        self.store
            .put_opts(
                location,
                PutPayload::from(data),
                StorePutOptions {
                    attributes,
                    ..Default::default()
                },
            )
            .await?;

        options.report_progress(total, total);
        Ok(())
    }

    async fn put_multipart(
        &self,
        location: &Path,
        data: Bytes,
        options: &PutOptions,
    ) -> Result<(), object_store::Error> {
        let total = data.len() as u64;
        let mut upload = self.store.put_multipart(location).await?;
        let mut loaded = 0u64;

        let mut offset = 0usize;
        while offset < data.len() {
            let end = (offset + self.part_size).min(data.len());
            let part = data.slice(offset..end);
            if let Err(e) = upload.put_part(PutPayload::from(part)).await {
                if let Err(abort_err) = upload.abort().await {
                    tracing::warn!(error = %abort_err, "S3 multipart abort failed");
                }
                return Err(e);
            }
            loaded += (end - offset) as u64;
            options.report_progress(loaded, total);
            offset = end;
        }

        upload.complete().await?;
        Ok(())
    }

    fn summary(visibility: Visibility, meta: &ObjectMeta) -> Option<ObjectSummary> {
        let key = unscoped_key(visibility, meta.location.as_ref())?;
        Some(ObjectSummary {
            key: key.to_string(),
            size: Some(meta.size as u64),
            last_modified: meta.last_modified,
        })
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put(&self, key: &str, data: Bytes, options: PutOptions) -> StorageResult<PutResult> {
        validate_key(key)?;
        let location = Path::from(scoped_key(options.visibility, key));
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        let result = if data.len() <= self.part_size {
            self.put_single(&location, data, &options).await
        } else {
            self.put_multipart(&location, data, &options).await
        };

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(PutResult {
            key: key.to_string(),
        })
    }

    async fn list(&self, prefix: &str, options: ListOptions) -> StorageResult<ListResult> {
        let start = std::time::Instant::now();
        let max_keys = options.max_keys.max(1);
        let visibility = options.visibility;
        let physical_prefix = scoped_key(visibility, prefix);
        let prefix_path = Path::from(physical_prefix.as_str());

        // The token is the physical key of the last object already returned.
        let stream = match &options.continuation_token {
            Some(token) => {
                validate_key(token.as_str())
                    .map_err(|_| StorageError::InvalidToken(token.to_string()))?;
                let offset = Path::from(token.as_str());
                self.store.list_with_offset(Some(&prefix_path), &offset)
            }
            None => self.store.list(Some(&prefix_path)),
        };

        let mut metas: Vec<ObjectMeta> = stream
            .take(max_keys + 1)
            .try_collect()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    prefix = %physical_prefix,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 list failed"
                );
                StorageError::ListFailed(e.to_string())
            })?;

        let has_more = metas.len() > max_keys;
        metas.truncate(max_keys);

        let next_token = if has_more {
            metas
                .last()
                .map(|meta| ContinuationToken::new(meta.location.to_string()))
        } else {
            None
        };

        let results: Vec<ObjectSummary> = metas
            .iter()
            .filter_map(|meta| Self::summary(visibility, meta))
            .filter(|summary| summary.key.starts_with(prefix))
            .collect();

        tracing::debug!(
            bucket = %self.bucket,
            prefix = %physical_prefix,
            returned = results.len(),
            has_more = has_more,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 list successful"
        );

        Ok(ListResult {
            results,
            next_token,
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
