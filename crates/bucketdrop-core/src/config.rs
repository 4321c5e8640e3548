//! Configuration module
//!
//! Configuration is read from the environment (with `.env` support) into
//! `UploaderConfig` and exposed through getters on `Config`.

use std::env;

use crate::constants::{
    DEFAULT_LOCAL_STORAGE_PATH, DEFAULT_MAX_CONCURRENT_UPLOADS, LISTING_DISPLAY_LIMIT,
    LISTING_MAX_KEYS,
};
use crate::models::LoadMoreMode;
use crate::storage_types::{StorageBackend, Visibility};

/// Base configuration shared by every front end
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub environment: String,
    pub log_filter: Option<String>,
}

/// Uploader configuration
#[derive(Clone, Debug)]
pub struct UploaderConfig {
    pub base: BaseConfig,
    // Identity
    pub user_email: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: String,
    // Upload behaviour
    pub upload_visibility: Visibility,
    pub max_concurrent_uploads: usize,
    // Listing behaviour
    pub listing_max_keys: usize,
    pub listing_display_limit: usize,
    pub load_more_mode: LoadMoreMode,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<UploaderConfig>);

impl Config {
    fn as_uploader(&self) -> &UploaderConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_uploader().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = UploaderConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_uploader().validate()
    }

    // Convenience getters
    pub fn environment(&self) -> &str {
        &self.as_uploader().base.environment
    }

    pub fn log_filter(&self) -> Option<&str> {
        self.as_uploader().base.log_filter.as_deref()
    }

    pub fn user_email(&self) -> &str {
        &self.as_uploader().user_email
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_uploader().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_uploader().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_uploader().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_uploader().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_uploader().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> &str {
        &self.as_uploader().local_storage_path
    }

    pub fn upload_visibility(&self) -> Visibility {
        self.as_uploader().upload_visibility
    }

    pub fn max_concurrent_uploads(&self) -> usize {
        self.as_uploader().max_concurrent_uploads
    }

    pub fn listing_max_keys(&self) -> usize {
        self.as_uploader().listing_max_keys
    }

    pub fn listing_display_limit(&self) -> usize {
        self.as_uploader().listing_display_limit
    }

    pub fn load_more_mode(&self) -> LoadMoreMode {
        self.as_uploader().load_more_mode
    }
}

impl UploaderConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let base = BaseConfig {
            environment,
            log_filter: env::var("RUST_LOG").ok(),
        };

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::Local,
        };

        let upload_visibility = match env::var("UPLOAD_VISIBILITY") {
            Ok(value) => value.parse()?,
            Err(_) => Visibility::default(),
        };

        let load_more_mode = match env::var("LOAD_MORE_MODE") {
            Ok(value) => value.parse()?,
            Err(_) => LoadMoreMode::default(),
        };

        let config = UploaderConfig {
            base,
            user_email: env::var("USER_EMAIL")
                .map_err(|_| anyhow::anyhow!("USER_EMAIL must be set to identify the uploader"))?,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|_| DEFAULT_LOCAL_STORAGE_PATH.to_string()),
            upload_visibility,
            max_concurrent_uploads: env::var("MAX_CONCURRENT_UPLOADS")
                .unwrap_or_else(|_| DEFAULT_MAX_CONCURRENT_UPLOADS.to_string())
                .parse::<usize>()
                .unwrap_or(DEFAULT_MAX_CONCURRENT_UPLOADS)
                .max(1),
            listing_max_keys: env::var("LISTING_MAX_KEYS")
                .unwrap_or_else(|_| LISTING_MAX_KEYS.to_string())
                .parse::<usize>()
                .unwrap_or(LISTING_MAX_KEYS)
                .clamp(1, LISTING_MAX_KEYS),
            listing_display_limit: env::var("LISTING_DISPLAY_LIMIT")
                .unwrap_or_else(|_| LISTING_DISPLAY_LIMIT.to_string())
                .parse::<usize>()
                .unwrap_or(LISTING_DISPLAY_LIMIT)
                .max(1),
            load_more_mode,
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.user_email.trim().is_empty() {
            return Err(anyhow::anyhow!("USER_EMAIL cannot be empty"));
        }

        if self.storage_backend == StorageBackend::S3 {
            if self.s3_bucket.is_none() {
                return Err(anyhow::anyhow!(
                    "S3_BUCKET must be set when STORAGE_BACKEND=s3"
                ));
            }
            if self.s3_region.is_none() && self.aws_region.is_none() {
                return Err(anyhow::anyhow!(
                    "S3_REGION or AWS_REGION must be set when STORAGE_BACKEND=s3"
                ));
            }
        }

        Ok(())
    }
}
