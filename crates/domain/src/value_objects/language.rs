//! Supported spoken languages

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// A language the voice pipeline can transcribe and synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    /// English (Indian locale)
    #[default]
    #[serde(rename = "en")]
    English,
    /// Hindi
    #[serde(rename = "hi")]
    Hindi,
    /// Odia
    #[serde(rename = "or")]
    Odia,
}

impl Language {
    /// All supported languages
    pub const ALL: [Self; 3] = [Self::English, Self::Hindi, Self::Odia];

    /// ISO 639-1 code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Odia => "or",
        }
    }

    /// BCP 47 tag for the Indian locale, as expected by cloud speech APIs
    #[must_use]
    pub const fn locale(&self) -> &'static str {
        match self {
            Self::English => "en-IN",
            Self::Hindi => "hi-IN",
            Self::Odia => "or-IN",
        }
    }

    /// Human readable name
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Odia => "Odia",
        }
    }

    /// Parse a language code or alias, case-insensitively
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let normalized = input.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "en" | "english" | "en-in" | "en-us" => Ok(Self::English),
            "hi" | "hindi" | "hi-in" => Ok(Self::Hindi),
            "or" | "odia" | "oriya" | "od" | "or-in" => Ok(Self::Odia),
            _ => Err(DomainError::UnsupportedLanguage(input.trim().to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
