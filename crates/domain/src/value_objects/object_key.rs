//! Object store keys for transient audio

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AudioFormat, SessionId};
use crate::errors::DomainError;

/// Lifecycle class of a transient audio object
///
/// The class is encoded as the first key segment so that bucket lifecycle
/// rules can expire objects that explicit deletion missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleClass {
    /// Caller uploads awaiting transcription (short-lived)
    Upload,
    /// Synthesized responses handed back to callers (longer-lived)
    Response,
    /// Scratch objects (short-lived)
    Temp,
}

impl LifecycleClass {
    /// Key prefix for objects of this class
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Upload => "uploads",
            Self::Response => "responses",
            Self::Temp => "temp",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "uploads" => Some(Self::Upload),
            "responses" => Some(Self::Response),
            "temp" => Some(Self::Temp),
            _ => None,
        }
    }
}

/// A validated object store key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKey {
    value: String,
}

impl ObjectKey {
    /// Maximum key length accepted by S3-compatible stores
    pub const MAX_LEN: usize = 1024;

    /// Validate an arbitrary key
    ///
    /// Rejects empty keys, absolute keys, empty segments, `.`/`..` segments
    /// and control characters.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::InvalidObjectKey(
                "Object key must not be empty".to_string(),
            ));
        }
        if value.len() > Self::MAX_LEN {
            return Err(DomainError::InvalidObjectKey(format!(
                "Object key must be at most {} bytes",
                Self::MAX_LEN
            )));
        }
        if value.chars().any(char::is_control) {
            return Err(DomainError::InvalidObjectKey(
                "Object key contains control characters".to_string(),
            ));
        }
        if value
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(DomainError::InvalidObjectKey(value));
        }

        Ok(Self { value })
    }

    /// Validate a caller-supplied reference to previously uploaded audio
    pub fn upload_ref(value: impl Into<String>) -> Result<Self, DomainError> {
        let key = Self::new(value)?;
        if key.lifecycle_class() != Some(LifecycleClass::Upload) {
            return Err(DomainError::InvalidObjectKey(format!(
                "Audio reference must start with {}/",
                LifecycleClass::Upload.prefix()
            )));
        }
        Ok(key)
    }

    /// Generate a fresh key `{class}/{session}/{uuid}.{ext}`
    #[must_use]
    pub fn generate(class: LifecycleClass, session: &SessionId, format: AudioFormat) -> Self {
        Self {
            value: format!(
                "{}/{}/{}.{}",
                class.prefix(),
                session.as_str(),
                Uuid::new_v4().simple(),
                format.extension()
            ),
        }
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Lifecycle class derived from the key prefix
    #[must_use]
    pub fn lifecycle_class(&self) -> Option<LifecycleClass> {
        self.value
            .split('/')
            .next()
            .and_then(LifecycleClass::from_prefix)
    }

    /// Last path segment, used as the upload filename for providers
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.value.rsplit('/').next().unwrap_or(&self.value)
    }

    /// Audio format derived from the key extension
    #[must_use]
    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat::from_key(&self.value)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl TryFrom<String> for ObjectKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
