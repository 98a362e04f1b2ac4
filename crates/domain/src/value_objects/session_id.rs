//! Session identifier value object

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// An opaque caller identifier that scopes rate-limit quota
///
/// Sessions carry no authentication semantics. The identifier is only
/// validated so it can be embedded safely in counter keys and object keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId {
    value: String,
}

impl SessionId {
    /// Maximum accepted length after trimming
    pub const MAX_LEN: usize = 128;

    /// Create a new session id, validating length and character set
    ///
    /// Allowed characters: ASCII alphanumerics and `-`, `_`, `.`, `:`, `@`.
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::InvalidSessionId(
                "Session id must not be empty".to_string(),
            ));
        }

        if value.len() > Self::MAX_LEN {
            return Err(DomainError::InvalidSessionId(format!(
                "Session id must be at most {} characters",
                Self::MAX_LEN
            )));
        }

        if let Some(bad) = value.chars().find(|c| !Self::is_allowed(*c)) {
            return Err(DomainError::InvalidSessionId(format!(
                "Session id contains invalid character {bad:?}"
            )));
        }

        Ok(Self { value })
    }

    const fn is_allowed(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '@')
    }

    /// Get the session id as a string slice
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl TryFrom<String> for SessionId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for SessionId {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
