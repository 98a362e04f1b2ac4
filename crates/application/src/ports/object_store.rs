//! Object store port - raw access to transient audio objects

use std::time::Duration;

use async_trait::async_trait;
use domain::ObjectKey;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Bucket holding uploaded and synthesized audio
///
/// All failures surface as `ApplicationError::Storage`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStorePort: Send + Sync {
    /// Store an object
    async fn put(
        &self,
        key: &ObjectKey,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ApplicationError>;

    /// Fetch an object's bytes
    async fn get(&self, key: &ObjectKey) -> Result<Vec<u8>, ApplicationError>;

    /// Delete an object; deleting a missing object succeeds
    async fn delete(&self, key: &ObjectKey) -> Result<(), ApplicationError>;

    /// Time-bounded handle allowing a client to PUT the object
    async fn presign_upload(
        &self,
        key: &ObjectKey,
        content_type: &str,
        expiry: Duration,
    ) -> Result<String, ApplicationError>;

    /// Time-bounded handle allowing a client to GET the object
    async fn presign_download(
        &self,
        key: &ObjectKey,
        expiry: Duration,
    ) -> Result<String, ApplicationError>;

    /// Store-native URI of the object (e.g. `s3://bucket/key`)
    fn object_uri(&self, key: &ObjectKey) -> String;
}
