//! Request types that carry independent quotas

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of metered work a request performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    /// Speech-to-text
    Asr,
    /// Text-to-speech
    Tts,
}

impl RequestType {
    /// Both metered request types
    pub const ALL: [Self; 2] = [Self::Asr, Self::Tts];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asr => "asr",
            Self::Tts => "tts",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(RequestType::Asr.as_str(), "asr");
        assert_eq!(RequestType::Tts.to_string(), "tts");
    }

    #[test]
    fn serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&RequestType::Asr).unwrap(), "\"asr\"");
    }
}
