//! Types for speech processing
//!
//! Audio payloads and transcriptions exchanged with speech providers.

use domain::AudioFormat;
use serde::{Deserialize, Serialize};

/// Audio bytes tagged with their container format
#[derive(Clone, PartialEq, Eq)]
pub struct AudioData {
    data: Vec<u8>,
    format: AudioFormat,
}

impl std::fmt::Debug for AudioData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioData")
            .field("format", &self.format)
            .field("size_bytes", &self.data.len())
            .finish()
    }
}

impl AudioData {
    #[must_use]
    pub const fn new(data: Vec<u8>, format: AudioFormat) -> Self {
        Self { data, format }
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    #[must_use]
    pub const fn format(&self) -> AudioFormat {
        self.format
    }

    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// File name used for multipart uploads, e.g. `audio.wav`
    #[must_use]
    pub fn filename(&self, base: &str) -> String {
        format!("{base}.{}", self.format.extension())
    }
}

/// Result of a transcription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub text: String,
    /// Language reported or requested
    #[serde(default)]
    pub language: Option<String>,
    /// Backend confidence in `[0, 1]`, when reported
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl Transcription {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: None,
            confidence: None,
            duration_ms: None,
        }
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub const fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    #[must_use]
    pub const fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// True when the text holds nothing but whitespace
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_filename_uses_extension() {
        let audio = AudioData::new(vec![1, 2], AudioFormat::M4a);
        assert_eq!(audio.filename("audio"), "audio.m4a");
        assert_eq!(audio.mime_type(), "audio/mp4");
        assert_eq!(audio.size_bytes(), 2);
    }

    #[test]
    fn debug_omits_bytes() {
        let audio = AudioData::new(vec![9; 64], AudioFormat::Wav);
        let rendered = format!("{audio:?}");
        assert!(rendered.contains("size_bytes: 64"));
        assert!(!rendered.contains("9, 9"));
    }

    #[test]
    fn whitespace_transcription_is_empty() {
        assert!(Transcription::new("  \n").is_empty());
        assert!(!Transcription::new("rice").is_empty());
    }

    #[test]
    fn transcription_builder() {
        let t = Transcription::new("hello")
            .with_language("en")
            .with_confidence(0.8)
            .with_duration(1500);
        assert_eq!(t.language.as_deref(), Some("en"));
        assert_eq!(t.confidence, Some(0.8));
        assert_eq!(t.duration_ms, Some(1500));
    }
}
