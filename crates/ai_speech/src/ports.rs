//! Port definitions for speech processing
//!
//! Defines the traits (ports) that speech providers implement.

use async_trait::async_trait;
use domain::{AudioFormat, Language};

use crate::error::SpeechError;
use crate::types::{AudioData, Transcription};

/// Speech-to-text over raw audio bytes
///
/// # Example
///
/// ```ignore
/// use ai_speech::{AudioData, SpeechToText};
/// use domain::{AudioFormat, Language};
///
/// async fn transcribe_clip(stt: &impl SpeechToText, bytes: Vec<u8>) -> Result<String, SpeechError> {
///     let audio = AudioData::new(bytes, AudioFormat::Wav);
///     Ok(stt.transcribe(audio, Language::Odia).await?.text)
/// }
/// ```
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe audio, hinting the spoken language
    ///
    /// # Errors
    ///
    /// Returns `SpeechError` if transcription fails.
    async fn transcribe(
        &self,
        audio: AudioData,
        language: Language,
    ) -> Result<Transcription, SpeechError>;

    /// Name of the STT model in use
    fn model_name(&self) -> &str;
}

/// Speech-to-text over audio already held in object storage
#[async_trait]
pub trait StoredAudioTranscriber: Send + Sync {
    /// Transcribe the object at `media_uri` (e.g. `s3://bucket/key`)
    ///
    /// # Errors
    ///
    /// Returns `SpeechError` if the job fails, times out or cannot be started.
    async fn transcribe_stored(
        &self,
        media_uri: &str,
        format: AudioFormat,
        language: Language,
    ) -> Result<Transcription, SpeechError>;
}

/// Text-to-speech
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize `text` in `language`
    ///
    /// # Errors
    ///
    /// Returns `SpeechError` if synthesis fails.
    async fn synthesize(&self, text: &str, language: Language) -> Result<AudioData, SpeechError>;

    /// Name of the TTS model or engine in use
    fn model_name(&self) -> &str;
}
