//! Application-level errors

use std::fmt;

use domain::{DomainError, PipelineResult, PipelineStage, RequestType};
use serde::Serialize;
use thiserror::Error;

use crate::retry::Retryable;

/// Whether a provider failure is worth retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderErrorKind {
    /// Timeouts, 5xx responses, throttling, connection failures
    Transient,
    /// Unsupported input, 4xx responses, empty output
    Permanent,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => f.write_str("transient"),
            Self::Permanent => f.write_str("permanent"),
        }
    }
}

/// Uniform failure of a speech or retrieval backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{provider} {kind} error: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub provider: String,
    pub message: String,
}

impl ProviderError {
    pub fn transient(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Transient,
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn permanent(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Permanent,
            provider: provider.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.kind == ProviderErrorKind::Transient
    }
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level validation error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Malformed or missing input
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Admission refused for a request type
    #[error("Rate limit exceeded for {request_type}, retry after {retry_after_secs}s")]
    RateLimited {
        request_type: RequestType,
        retry_after_secs: u64,
    },

    /// Speech or retrieval backend failure
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Counter store unavailable; requests are denied
    #[error("Counter store error: {0}")]
    CounterStore(String),

    /// Object store put/get/delete/presign failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable error category reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    RateLimitExceeded,
    ProviderError,
    CounterStoreError,
    StorageError,
    InternalError,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::ProviderError => "provider_error",
            Self::CounterStoreError => "counter_store_error",
            Self::StorageError => "storage_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl ApplicationError {
    /// Category of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) | Self::Validation(_) => ErrorKind::ValidationError,
            Self::RateLimited { .. } => ErrorKind::RateLimitExceeded,
            Self::Provider(_) => ErrorKind::ProviderError,
            Self::CounterStore(_) => ErrorKind::CounterStoreError,
            Self::Storage(_) => ErrorKind::StorageError,
            Self::Configuration(_) | Self::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Check if a caller may retry the same request later
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Provider(err) => matches!(err.kind, ProviderErrorKind::Transient),
            _ => false,
        }
    }
}

/// A pipeline run that aborted, with the stage it reached and what it produced
#[derive(Debug, Error)]
#[error("pipeline aborted at {stage_reached}: {error}")]
pub struct PipelineFailure {
    #[source]
    pub error: ApplicationError,
    pub stage_reached: PipelineStage,
    pub partial: PipelineResult,
}

impl PipelineFailure {
    /// Failure before any stage ran
    #[must_use]
    pub fn at_received(error: ApplicationError) -> Self {
        Self {
            error,
            stage_reached: PipelineStage::Received,
            partial: PipelineResult::new(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}
