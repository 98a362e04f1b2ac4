//! Transient audio object lifecycle
//!
//! Issues time-bounded upload and download handles, stores synthesized
//! responses and deletes consumed uploads. Raw storage mechanics stay
//! behind [`ObjectStorePort`].

use std::{fmt, sync::Arc, time::Duration};

use domain::{AudioFormat, LifecycleClass, ObjectKey, SessionId};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::{error::ApplicationError, ports::ObjectStorePort};

/// A presigned upload slot handed to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadHandle {
    pub upload_url: String,
    pub object_key: ObjectKey,
    pub expires_in: u64,
    pub content_type: String,
}

/// A presigned download link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadHandle {
    pub url: String,
    pub expires_in: u64,
}

/// Handle expiries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    pub upload_expiry: Duration,
    pub download_expiry: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            upload_expiry: Duration::from_secs(300),
            download_expiry: Duration::from_secs(300),
        }
    }
}

/// Manages upload, response and temp objects
pub struct ObjectLifecycleManager {
    store: Arc<dyn ObjectStorePort>,
    config: LifecycleConfig,
}

impl fmt::Debug for ObjectLifecycleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectLifecycleManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ObjectLifecycleManager {
    pub fn new(store: Arc<dyn ObjectStorePort>, config: LifecycleConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub const fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Reserve an upload key for `session` and presign a PUT for it
    #[instrument(skip_all, fields(session = %session, format = %format))]
    pub async fn issue_upload_handle(
        &self,
        session: &SessionId,
        format: AudioFormat,
    ) -> Result<UploadHandle, ApplicationError> {
        let key = ObjectKey::generate(LifecycleClass::Upload, session, format);
        let url = self
            .store
            .presign_upload(&key, format.mime_type(), self.config.upload_expiry)
            .await?;

        debug!(object_key = %key, "Issued upload handle");
        Ok(UploadHandle {
            upload_url: url,
            object_key: key,
            expires_in: self.config.upload_expiry.as_secs(),
            content_type: format.mime_type().to_string(),
        })
    }

    /// Presign a GET for an existing object
    pub async fn issue_download_handle(
        &self,
        key: &ObjectKey,
    ) -> Result<DownloadHandle, ApplicationError> {
        let url = self
            .store
            .presign_download(key, self.config.download_expiry)
            .await?;
        Ok(DownloadHandle {
            url,
            expires_in: self.config.download_expiry.as_secs(),
        })
    }

    /// Store synthesized audio under `responses/`
    #[instrument(skip_all, fields(session = %session, bytes = audio.len()))]
    pub async fn store_response(
        &self,
        session: &SessionId,
        audio: Vec<u8>,
        format: AudioFormat,
    ) -> Result<ObjectKey, ApplicationError> {
        let key = ObjectKey::generate(LifecycleClass::Response, session, format);
        self.store.put(&key, audio, format.mime_type()).await?;
        Ok(key)
    }

    /// Delete an object
    pub async fn delete(&self, key: &ObjectKey) -> Result<(), ApplicationError> {
        self.store.delete(key).await
    }

    /// Delete an object, logging instead of failing
    ///
    /// Returns whether the delete succeeded. Objects left behind are
    /// reclaimed by the bucket lifecycle policy.
    pub async fn release(&self, key: &ObjectKey) -> bool {
        match self.store.delete(key).await {
            Ok(()) => {
                debug!(object_key = %key, "Released transient object");
                true
            },
            Err(e) => {
                warn!(object_key = %key, error = %e, "Failed to release transient object");
                false
            },
        }
    }
}
