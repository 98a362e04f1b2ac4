//! In-process object store for development and tests

use std::{collections::HashMap, time::Duration};

use application::{error::ApplicationError, ports::ObjectStorePort};
use async_trait::async_trait;
use domain::ObjectKey;
use parking_lot::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    content_type: String,
}

/// Object store holding everything in a map
///
/// Handles are `memory://` URLs that only this process understands.
#[derive(Debug)]
pub struct MemoryObjectStore {
    bucket: String,
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Whether an object exists under `key`
    #[must_use]
    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.objects.read().contains_key(key.as_str())
    }

    /// Number of stored objects
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Content type recorded at `put`
    #[must_use]
    pub fn content_type(&self, key: &ObjectKey) -> Option<String> {
        self.objects
            .read()
            .get(key.as_str())
            .map(|o| o.content_type.clone())
    }

    fn handle(&self, key: &ObjectKey, expiry: Duration) -> String {
        format!(
            "memory://{}/{}?expires_in={}",
            self.bucket,
            key.as_str(),
            expiry.as_secs()
        )
    }
}

#[async_trait]
impl ObjectStorePort for MemoryObjectStore {
    async fn put(
        &self,
        key: &ObjectKey,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ApplicationError> {
        debug!(key = %key, size = bytes.len(), "Storing object");
        self.objects.write().insert(
            key.as_str().to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &ObjectKey) -> Result<Vec<u8>, ApplicationError> {
        self.objects
            .read()
            .get(key.as_str())
            .map(|o| o.bytes.clone())
            .ok_or_else(|| ApplicationError::Storage(format!("object not found: {key}")))
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), ApplicationError> {
        self.objects.write().remove(key.as_str());
        Ok(())
    }

    async fn presign_upload(
        &self,
        key: &ObjectKey,
        _content_type: &str,
        expiry: Duration,
    ) -> Result<String, ApplicationError> {
        Ok(self.handle(key, expiry))
    }

    async fn presign_download(
        &self,
        key: &ObjectKey,
        expiry: Duration,
    ) -> Result<String, ApplicationError> {
        Ok(self.handle(key, expiry))
    }

    fn object_uri(&self, key: &ObjectKey) -> String {
        format!("memory://{}/{}", self.bucket, key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ObjectKey {
        ObjectKey::new("uploads/s1/clip.wav").unwrap()
    }

    #[tokio::test]
    async fn put_get_delete() {
        let store = MemoryObjectStore::new("bucket");
        store.put(&key(), vec![1, 2, 3], "audio/wav").await.unwrap();

        assert!(store.contains(&key()));
        assert_eq!(store.get(&key()).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(store.content_type(&key()).as_deref(), Some("audio/wav"));

        store.delete(&key()).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn missing_object_is_storage_error() {
        let store = MemoryObjectStore::new("bucket");
        let err = store.get(&key()).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Storage(_)));
    }

    #[tokio::test]
    async fn deleting_missing_object_succeeds() {
        let store = MemoryObjectStore::new("bucket");
        assert!(store.delete(&key()).await.is_ok());
    }

    #[tokio::test]
    async fn handles_carry_expiry() {
        let store = MemoryObjectStore::new("bucket");
        let url = store
            .presign_download(&key(), Duration::from_secs(300))
            .await
            .unwrap();
        assert_eq!(url, "memory://bucket/uploads/s1/clip.wav?expires_in=300");
        assert_eq!(store.object_uri(&key()), "memory://bucket/uploads/s1/clip.wav");
    }
}
