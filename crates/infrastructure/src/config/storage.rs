//! Object storage configuration.

use std::time::Duration;

use application::LifecycleConfig;
use serde::{Deserialize, Serialize};

/// Object store implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local map, for development and tests
    #[default]
    Memory,
    /// S3 or an S3-compatible service
    S3,
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default = "default_bucket")]
    pub bucket: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Custom endpoint for S3-compatible services (MinIO, LocalStack)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Static credentials; the default AWS chain is used when absent
    #[serde(default)]
    pub access_key: Option<String>,

    #[serde(default)]
    pub secret_key: Option<String>,

    /// Path-style addressing (`endpoint/bucket/key`)
    #[serde(default)]
    pub path_style: bool,

    #[serde(default = "default_expiry")]
    pub upload_url_expiry_secs: u64,

    #[serde(default = "default_expiry")]
    pub download_url_expiry_secs: u64,
}

fn default_bucket() -> String {
    "farmer-voice-audio".to_string()
}

fn default_region() -> String {
    "ap-south-1".to_string()
}

const fn default_expiry() -> u64 {
    300
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            bucket: default_bucket(),
            region: default_region(),
            endpoint: None,
            access_key: None,
            secret_key: None,
            path_style: false,
            upload_url_expiry_secs: default_expiry(),
            download_url_expiry_secs: default_expiry(),
        }
    }
}

impl StorageConfig {
    /// Handle expiries for the lifecycle manager
    #[must_use]
    pub const fn lifecycle(&self) -> LifecycleConfig {
        LifecycleConfig {
            upload_expiry: Duration::from_secs(self.upload_url_expiry_secs),
            download_expiry: Duration::from_secs(self.download_url_expiry_secs),
        }
    }

    pub(super) fn validate(&self, errors: &mut Vec<String>) {
        if self.bucket.trim().is_empty() {
            errors.push("storage.bucket must not be empty".to_string());
        }
        // S3 presigned URLs are valid for at most 7 days
        for (name, secs) in [
            ("upload_url_expiry_secs", self.upload_url_expiry_secs),
            ("download_url_expiry_secs", self.download_url_expiry_secs),
        ] {
            if secs == 0 || secs > 604_800 {
                errors.push(format!("storage.{name} must be between 1 and 604800"));
            }
        }
        if self.access_key.is_some() != self.secret_key.is_some() {
            errors.push("storage.access_key and storage.secret_key must be set together".into());
        }
    }
}
