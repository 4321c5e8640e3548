//! Error types module
//!
//! `AppError` is the error every front end (currently the CLI) renders. The
//! storage and service crates keep their own narrower error enums and convert
//! into `AppError` at the boundary.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like invalid input
    Debug,
    /// Warning level - for recoverable user-facing conditions
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the user
pub trait ErrorMetadata {
    /// Process exit code to use when the error ends a command
    fn exit_code(&self) -> u8;

    /// Machine-readable error code (e.g., "EMPTY_BATCH")
    fn error_code(&self) -> &'static str;

    /// Whether the user can simply retry
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No files selected")]
    EmptyBatch,

    #[error("Transfer of {filename} failed: {reason}")]
    TransferFailed { filename: String, reason: String },

    #[error("Listing stored objects failed: {0}")]
    ListingFailed(String),

    #[error("Identity error: {0}")]
    Identity(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => AppError::NotFound(err.to_string()),
            _ => AppError::Internal(format!("IO error: {}", err)),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

/// Static metadata for each variant: (exit_code, error_code, recoverable, suggested_action, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (u8, &'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        AppError::EmptyBatch => (
            2,
            "EMPTY_BATCH",
            true,
            Some("Select the files that you want to upload"),
            LogLevel::Warn,
        ),
        AppError::TransferFailed { .. } => (
            3,
            "TRANSFER_FAILED",
            true,
            Some("Upload the failed files again"),
            LogLevel::Error,
        ),
        AppError::ListingFailed(_) => (
            3,
            "LISTING_FAILED",
            true,
            Some("Retry the listing after a short delay"),
            LogLevel::Error,
        ),
        AppError::Identity(_) => (
            4,
            "IDENTITY_ERROR",
            false,
            Some("Sign in with an account that has an email address"),
            LogLevel::Warn,
        ),
        AppError::Storage(_) => (
            3,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::Config(_) => (
            78,
            "CONFIG_ERROR",
            false,
            Some("Check the environment variables and .env file"),
            LogLevel::Error,
        ),
        AppError::InvalidInput(_) => (
            2,
            "INVALID_INPUT",
            false,
            Some("Check command arguments and try again"),
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            2,
            "NOT_FOUND",
            false,
            Some("Verify the path exists"),
            LogLevel::Debug,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            1,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn exit_code(&self) -> u8 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            AppError::EmptyBatch => {
                "You must select the files that you want to upload.".to_string()
            }
            AppError::TransferFailed { filename, reason } => {
                format!("Upload of {} failed: {}", filename, reason)
            }
            AppError::ListingFailed(_) => "Failed to fetch the uploaded file list".to_string(),
            AppError::Identity(ref msg) => msg.clone(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Config(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal error".to_string()
            }
        }
    }
}
