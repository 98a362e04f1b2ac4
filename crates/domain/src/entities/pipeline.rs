//! Voice pipeline requests, stages and results

use std::fmt;

use serde::{Deserialize, Serialize};

use super::provider::{AsrProvider, TtsProvider};
use crate::{
    errors::DomainError,
    value_objects::{AudioFormat, Language, ObjectKey, RequestType, SessionId},
};

/// Stage of the per-request state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Request accepted and validated
    Received,
    /// Quota consumed for the next metered stage
    RateChecked,
    /// Speech-to-text
    Asr,
    /// Retrieval and answer generation
    RetrieveGenerate,
    /// Text-to-speech
    Tts,
    /// All stages finished
    Completed,
}

impl PipelineStage {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::RateChecked => "rate_checked",
            Self::Asr => "asr",
            Self::RetrieveGenerate => "retrieve_generate",
            Self::Tts => "tts",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three pipeline shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    /// Transcribe uploaded audio
    AsrOnly,
    /// Synthesize text
    TtsOnly,
    /// Transcribe, answer, then synthesize the answer
    Ask,
}

impl PipelineKind {
    /// Ordered stages this kind walks through on the happy path
    #[must_use]
    pub const fn sequence(&self) -> &'static [PipelineStage] {
        use PipelineStage::{Asr, Completed, RateChecked, Received, RetrieveGenerate, Tts};
        match self {
            Self::AsrOnly => &[Received, RateChecked, Asr, Completed],
            Self::TtsOnly => &[Received, RateChecked, Tts, Completed],
            Self::Ask => &[
                Received,
                RateChecked,
                Asr,
                RetrieveGenerate,
                RateChecked,
                Tts,
                Completed,
            ],
        }
    }

    /// Quota charged at the rate check preceding `stage`
    #[must_use]
    pub const fn quota_for(stage: PipelineStage) -> Option<RequestType> {
        match stage {
            PipelineStage::Asr => Some(RequestType::Asr),
            PipelineStage::Tts => Some(RequestType::Tts),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AsrOnly => "asr_only",
            Self::TtsOnly => "tts_only",
            Self::Ask => "ask",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the caller handed in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineInput {
    /// Reference to previously uploaded audio
    SourceAudio(ObjectKey),
    /// Text to synthesize
    Text(String),
}

/// An incoming pipeline invocation, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub session_id: SessionId,
    pub language: Language,
    pub kind: PipelineKind,
    pub input: PipelineInput,
    /// Return synthesized audio inline instead of storing it
    pub inline_audio: bool,
}

impl PipelineRequest {
    /// Maximum characters accepted for synthesis
    pub const MAX_TEXT_CHARS: usize = 5000;

    /// Build an ASR-only request
    #[must_use]
    pub const fn asr(session_id: SessionId, language: Language, audio_ref: ObjectKey) -> Self {
        Self {
            session_id,
            language,
            kind: PipelineKind::AsrOnly,
            input: PipelineInput::SourceAudio(audio_ref),
            inline_audio: false,
        }
    }

    /// Build a TTS-only request, validating the text
    pub fn tts(
        session_id: SessionId,
        language: Language,
        text: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(DomainError::ValidationError(
                "text must not be empty".to_string(),
            ));
        }
        let chars = text.chars().count();
        if chars > Self::MAX_TEXT_CHARS {
            return Err(DomainError::ValidationError(format!(
                "text must be at most {} characters, got {chars}",
                Self::MAX_TEXT_CHARS
            )));
        }
        Ok(Self {
            session_id,
            language,
            kind: PipelineKind::TtsOnly,
            input: PipelineInput::Text(text),
            inline_audio: false,
        })
    }

    /// Build a full ask request
    #[must_use]
    pub const fn ask(session_id: SessionId, language: Language, audio_ref: ObjectKey) -> Self {
        Self {
            session_id,
            language,
            kind: PipelineKind::Ask,
            input: PipelineInput::SourceAudio(audio_ref),
            inline_audio: false,
        }
    }

    /// Return synthesized audio inline (TTS-only)
    #[must_use]
    pub const fn with_inline_audio(mut self, inline: bool) -> Self {
        self.inline_audio = inline;
        self
    }

    #[must_use]
    pub const fn source_audio(&self) -> Option<&ObjectKey> {
        match &self.input {
            PipelineInput::SourceAudio(key) => Some(key),
            PipelineInput::Text(_) => None,
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.input {
            PipelineInput::Text(text) => Some(text),
            PipelineInput::SourceAudio(_) => None,
        }
    }
}

/// How synthesized audio is handed back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "delivery", rename_all = "snake_case")]
pub enum AudioDelivery {
    /// Stored object with a time-bounded download handle
    DownloadUrl {
        object_key: ObjectKey,
        url: String,
        expires_in_secs: u64,
    },
    /// Raw bytes returned in the response
    Inline { bytes: Vec<u8>, format: AudioFormat },
}

/// Providers that served the request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvidersUsed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asr: Option<AsrProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts: Option<TtsProvider>,
}

/// Everything a pipeline run produced, up to the stage it reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioDelivery>,
    pub provider_used: ProvidersUsed,
    pub stage_reached: PipelineStage,
}

impl PipelineResult {
    /// Empty result at `Received`
    #[must_use]
    pub const fn new() -> Self {
        Self {
            transcript: None,
            answer: None,
            audio: None,
            provider_used: ProvidersUsed {
                asr: None,
                tts: None,
            },
            stage_reached: PipelineStage::Received,
        }
    }

    /// Whether any stage produced output
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.transcript.is_some() || self.answer.is_some()
    }
}

impl Default for PipelineResult {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionId {
        SessionId::new("s1").unwrap()
    }

    fn upload() -> ObjectKey {
        ObjectKey::upload_ref("uploads/s1/a.wav").unwrap()
    }

    #[test]
    fn sequences_start_received_and_end_completed() {
        for kind in [PipelineKind::AsrOnly, PipelineKind::TtsOnly, PipelineKind::Ask] {
            let seq = kind.sequence();
            assert_eq!(seq.first(), Some(&PipelineStage::Received));
            assert_eq!(seq.last(), Some(&PipelineStage::Completed));
        }
    }

    #[test]
    fn ask_checks_rate_before_each_metered_stage() {
        let seq = PipelineKind::Ask.sequence();
        for (i, stage) in seq.iter().enumerate() {
            if PipelineKind::quota_for(*stage).is_some() {
                assert_eq!(seq[i - 1], PipelineStage::RateChecked);
            }
        }
    }

    #[test]
    fn ask_runs_retrieval_between_asr_and_tts() {
        let seq = PipelineKind::Ask.sequence();
        let asr = seq.iter().position(|s| *s == PipelineStage::Asr).unwrap();
        let rg = seq
            .iter()
            .position(|s| *s == PipelineStage::RetrieveGenerate)
            .unwrap();
        let tts = seq.iter().position(|s| *s == PipelineStage::Tts).unwrap();
        assert!(asr < rg && rg < tts);
    }

    #[test]
    fn stage_names_are_snake_case() {
        assert_eq!(PipelineStage::RetrieveGenerate.as_str(), "retrieve_generate");
        assert_eq!(
            serde_json::to_string(&PipelineStage::RateChecked).unwrap(),
            "\"rate_checked\""
        );
    }

    #[test]
    fn tts_request_trims_text() {
        let request = PipelineRequest::tts(session(), Language::Hindi, "  namaste  ").unwrap();
        assert_eq!(request.text(), Some("namaste"));
        assert_eq!(request.kind, PipelineKind::TtsOnly);
        assert!(request.source_audio().is_none());
    }

    #[test]
    fn tts_request_rejects_blank_text() {
        assert!(PipelineRequest::tts(session(), Language::English, "   ").is_err());
    }

    #[test]
    fn tts_request_rejects_overlong_text() {
        let text = "a".repeat(PipelineRequest::MAX_TEXT_CHARS + 1);
        assert!(PipelineRequest::tts(session(), Language::English, text).is_err());
    }

    #[test]
    fn tts_limit_counts_characters_not_bytes() {
        let text = "क".repeat(PipelineRequest::MAX_TEXT_CHARS);
        assert!(PipelineRequest::tts(session(), Language::Hindi, text).is_ok());
    }

    #[test]
    fn ask_request_carries_audio_ref() {
        let request = PipelineRequest::ask(session(), Language::Odia, upload());
        assert_eq!(request.source_audio(), Some(&upload()));
        assert!(request.text().is_none());
        assert!(!request.inline_audio);
    }

    #[test]
    fn new_result_is_empty() {
        let result = PipelineResult::new();
        assert_eq!(result.stage_reached, PipelineStage::Received);
        assert!(!result.is_partial());
    }
}
