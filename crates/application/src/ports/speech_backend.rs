//! Speech backend ports - the uniform contract every provider adapter meets

use async_trait::async_trait;
use domain::{AsrProvider, AudioFormat, Language, ObjectKey, TtsProvider};
#[cfg(test)]
use mockall::automock;

use crate::error::ProviderError;

/// Normalized speech-to-text result
#[derive(Debug, Clone, PartialEq)]
pub struct AsrOutput {
    pub text: String,
    /// Confidence score (0.0 - 1.0) when the backend reports one
    pub confidence: Option<f32>,
    pub provider: AsrProvider,
}

/// Normalized text-to-speech result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtsOutput {
    pub audio: Vec<u8>,
    pub format: AudioFormat,
    pub provider: TtsProvider,
}

/// Speech-to-text backend
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AsrBackend: Send + Sync {
    /// Provider variant this backend serves
    fn provider(&self) -> AsrProvider;

    /// Transcribe previously uploaded audio
    ///
    /// # Arguments
    /// * `audio` - Key of the uploaded audio object
    /// * `language` - Spoken language of the audio
    async fn transcribe(
        &self,
        audio: &ObjectKey,
        language: Language,
    ) -> Result<AsrOutput, ProviderError>;
}

/// Text-to-speech backend
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// Provider variant this backend serves
    fn provider(&self) -> TtsProvider;

    /// Synthesize `text` spoken in `language`
    async fn synthesize(&self, text: &str, language: Language) -> Result<TtsOutput, ProviderError>;
}
