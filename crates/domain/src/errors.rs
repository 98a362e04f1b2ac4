//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Session identifier is missing or malformed
    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),

    /// Language code or alias is not supported
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Audio format is not supported
    #[error("Unsupported audio format: {0}")]
    UnsupportedAudioFormat(String),

    /// Object key is malformed or has the wrong lifecycle class
    #[error("Invalid object key: {0}")]
    InvalidObjectKey(String),

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Pipeline was driven into a stage its kind does not allow
    #[error("Invalid pipeline transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl DomainError {
    /// Create an invalid transition error
    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_creates_correct_error() {
        let err = DomainError::invalid_transition("received", "tts");
        match err {
            DomainError::InvalidTransition { from, to } => {
                assert_eq!(from, "received");
                assert_eq!(to, "tts");
            },
            _ => unreachable!("Expected InvalidTransition error"),
        }
    }

    #[test]
    fn invalid_transition_error_message() {
        let err = DomainError::invalid_transition("asr", "completed");
        assert_eq!(
            err.to_string(),
            "Invalid pipeline transition from asr to completed"
        );
    }

    #[test]
    fn invalid_session_error_message() {
        let err = DomainError::InvalidSessionId("empty".to_string());
        assert_eq!(err.to_string(), "Invalid session id: empty");
    }

    #[test]
    fn unsupported_language_error_message() {
        let err = DomainError::UnsupportedLanguage("fr".to_string());
        assert_eq!(err.to_string(), "Unsupported language: fr");
    }

    #[test]
    fn invalid_object_key_error_message() {
        let err = DomainError::InvalidObjectKey("../etc".to_string());
        assert_eq!(err.to_string(), "Invalid object key: ../etc");
    }

    #[test]
    fn validation_error_message() {
        let err = DomainError::ValidationError("text is required".to_string());
        assert_eq!(err.to_string(), "Validation failed: text is required");
    }
}
