use std::path::{Path, PathBuf};

use bucketdrop_core::constants::DEFAULT_MIME_TYPE;
use bucketdrop_core::{AppError, UploadRecord, UploadStatus};
use bytes::Bytes;
use serde::Serialize;

/// Where the bytes of a selected file come from.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// Contents already in memory.
    Bytes(Bytes),
    /// Read from disk when the transfer starts.
    Path(PathBuf),
}

impl FileSource {
    pub async fn load(&self) -> std::io::Result<Bytes> {
        match self {
            FileSource::Bytes(data) => Ok(data.clone()),
            FileSource::Path(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
        }
    }
}

/// A file handed to the tracker by the picker.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub source: FileSource,
}

impl RawFile {
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size_bytes: data.len() as u64,
            mime_type: mime_type.into(),
            source: FileSource::Bytes(data),
        }
    }

    /// Describe a file on disk. The content type is guessed from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("path has no file name: {}", path.display()),
                )
            })?;

        let mime_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        Ok(Self {
            name,
            size_bytes: metadata.len(),
            mime_type,
            source: FileSource::Path(path.to_path_buf()),
        })
    }
}

/// A transfer that ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferFailure {
    pub record_id: u64,
    pub filename: String,
    pub reason: String,
}

impl From<TransferFailure> for AppError {
    fn from(failure: TransferFailure) -> Self {
        AppError::TransferFailed {
            filename: failure.filename,
            reason: failure.reason,
        }
    }
}

/// Final state of every record created by one `start_upload` call.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub namespace: String,
    pub records: Vec<UploadRecord>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status == UploadStatus::Success)
            .count()
    }

    pub fn failures(&self) -> Vec<TransferFailure> {
        self.records
            .iter()
            .filter(|r| r.status == UploadStatus::Failed)
            .map(|r| TransferFailure {
                record_id: r.id,
                filename: r.filename.clone(),
                reason: r.error.clone().unwrap_or_default(),
            })
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded() == self.records.len()
    }
}
