//! S3 object store - transient audio in an S3 or S3-compatible bucket

use std::time::Duration;

use application::{error::ApplicationError, ports::ObjectStorePort};
use async_trait::async_trait;
use domain::ObjectKey;
use s3::{Bucket, Region, creds::Credentials};
use tracing::{debug, instrument, warn};

use crate::config::StorageConfig;

/// Object store over a single bucket
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    name: String,
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("bucket", &self.name)
            .finish_non_exhaustive()
    }
}

fn storage_error(action: &str, e: impl std::fmt::Display) -> ApplicationError {
    ApplicationError::Storage(format!("{action} failed: {e}"))
}

/// rust-s3 takes expiry in whole seconds as `u32`
fn expiry_secs(expiry: Duration) -> u32 {
    u32::try_from(expiry.as_secs()).unwrap_or(u32::MAX).max(1)
}

const fn is_success(status: u16) -> bool {
    status >= 200 && status < 300
}

impl S3ObjectStore {
    /// Build a bucket handle from configuration
    ///
    /// Static credentials are used when configured; otherwise the standard
    /// AWS environment variables and profile are consulted.
    pub fn new(config: &StorageConfig) -> Result<Self, ApplicationError> {
        let credentials = match (&config.access_key, &config.secret_key) {
            (Some(access), Some(secret)) => Credentials::new(
                Some(access.as_str()),
                Some(secret.as_str()),
                None,
                None,
                None,
            ),
            _ => Credentials::default(),
        }
        .map_err(|e| ApplicationError::Configuration(format!("S3 credentials: {e}")))?;

        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| ApplicationError::Configuration(format!("S3 region: {e}")))?,
        };

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| ApplicationError::Configuration(format!("S3 bucket: {e}")))?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            name: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl ObjectStorePort for S3ObjectStore {
    #[instrument(skip(self, bytes), fields(key = %key, size = bytes.len()))]
    async fn put(
        &self,
        key: &ObjectKey,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ApplicationError> {
        let response = self
            .bucket
            .put_object_with_content_type(key.as_str(), &bytes, content_type)
            .await
            .map_err(|e| storage_error("put", e))?;

        if !is_success(response.status_code()) {
            return Err(storage_error(
                "put",
                format!("status {}", response.status_code()),
            ));
        }
        debug!("Object stored");
        Ok(())
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn get(&self, key: &ObjectKey) -> Result<Vec<u8>, ApplicationError> {
        let response = self
            .bucket
            .get_object(key.as_str())
            .await
            .map_err(|e| storage_error("get", e))?;

        if !is_success(response.status_code()) {
            return Err(storage_error(
                "get",
                format!("status {}", response.status_code()),
            ));
        }
        Ok(response.as_slice().to_vec())
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn delete(&self, key: &ObjectKey) -> Result<(), ApplicationError> {
        let response = self
            .bucket
            .delete_object(key.as_str())
            .await
            .map_err(|e| storage_error("delete", e))?;

        match response.status_code() {
            status if is_success(status) => Ok(()),
            404 => {
                warn!("Object already gone");
                Ok(())
            },
            status => Err(storage_error("delete", format!("status {status}"))),
        }
    }

    async fn presign_upload(
        &self,
        key: &ObjectKey,
        _content_type: &str,
        expiry: Duration,
    ) -> Result<String, ApplicationError> {
        self.bucket
            .presign_put(key.as_str(), expiry_secs(expiry), None, None)
            .await
            .map_err(|e| storage_error("presign put", e))
    }

    async fn presign_download(
        &self,
        key: &ObjectKey,
        expiry: Duration,
    ) -> Result<String, ApplicationError> {
        self.bucket
            .presign_get(key.as_str(), expiry_secs(expiry), None)
            .await
            .map_err(|e| storage_error("presign get", e))
    }

    fn object_uri(&self, key: &ObjectKey) -> String {
        format!("s3://{}/{}", self.name, key.as_str())
    }
}
