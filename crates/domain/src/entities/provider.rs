//! Speech provider variants

use std::fmt;

use serde::{Deserialize, Serialize};

/// Group of providers sharing a vendor and credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderFamily {
    /// AWS speech services
    Primary,
    /// OpenAI speech services
    Secondary,
}

/// Speech-to-text backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AsrProvider {
    /// Amazon Transcribe
    Transcribe,
    /// OpenAI Whisper
    Whisper,
}

impl AsrProvider {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Transcribe => "transcribe",
            Self::Whisper => "whisper",
        }
    }

    #[must_use]
    pub const fn family(&self) -> ProviderFamily {
        match self {
            Self::Transcribe => ProviderFamily::Primary,
            Self::Whisper => ProviderFamily::Secondary,
        }
    }
}

/// Text-to-speech backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TtsProvider {
    /// Amazon Polly
    #[serde(rename = "polly")]
    Polly,
    /// OpenAI TTS
    #[serde(rename = "openai")]
    OpenAi,
}

impl TtsProvider {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Polly => "polly",
            Self::OpenAi => "openai",
        }
    }

    #[must_use]
    pub const fn family(&self) -> ProviderFamily {
        match self {
            Self::Polly => ProviderFamily::Primary,
            Self::OpenAi => ProviderFamily::Secondary,
        }
    }
}

/// Any provider, tagged by the operation it serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "operation", content = "provider", rename_all = "lowercase")]
pub enum Provider {
    Asr(AsrProvider),
    Tts(TtsProvider),
}

impl Provider {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Asr(p) => p.name(),
            Self::Tts(p) => p.name(),
        }
    }

    #[must_use]
    pub const fn family(&self) -> ProviderFamily {
        match self {
            Self::Asr(p) => p.family(),
            Self::Tts(p) => p.family(),
        }
    }
}

impl fmt::Display for AsrProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<AsrProvider> for Provider {
    fn from(p: AsrProvider) -> Self {
        Self::Asr(p)
    }
}

impl From<TtsProvider> for Provider {
    fn from(p: TtsProvider) -> Self {
        Self::Tts(p)
    }
}
