//! API error handling
//!
//! Every failure is rendered as
//! `{error, error_kind, stage_reached, retry_after?, request_type?, partial?,
//! transient?, provider?}`. Messages for store and internal failures are
//! replaced with fixed text; details go to the log only.

use application::{ApplicationError, ErrorKind, PipelineFailure};
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use domain::{DomainError, PipelineResult, PipelineStage, RequestType};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request rejected before any side effect
    #[error("{0}")]
    Validation(String),

    /// Pipeline or service failure, with the stage it reached
    #[error(transparent)]
    Pipeline(Box<PipelineFailure>),
}

impl From<PipelineFailure> for ApiError {
    fn from(failure: PipelineFailure) -> Self {
        Self::Pipeline(Box::new(failure))
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        PipelineFailure::at_received(error).into()
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        Self::Validation(error.to_string())
    }
}

/// Output produced before the failing stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialResult {
    pub transcribed_text: Option<String>,
    pub rag_response: Option<String>,
}

impl PartialResult {
    fn from_result(result: &PipelineResult) -> Option<Self> {
        result.is_partial().then(|| Self {
            transcribed_text: result.transcript.clone(),
            rag_response: result.answer.clone(),
        })
    }
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_kind: ErrorKind,
    pub stage_reached: PipelineStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_type: Option<RequestType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<PartialResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transient: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl ErrorResponse {
    const fn bare(error: String, error_kind: ErrorKind, stage_reached: PipelineStage) -> Self {
        Self {
            error,
            error_kind,
            stage_reached,
            retry_after: None,
            request_type: None,
            partial: None,
            transient: None,
            provider: None,
        }
    }
}

const fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
        ErrorKind::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::ProviderError => StatusCode::BAD_GATEWAY,
        ErrorKind::CounterStoreError | ErrorKind::StorageError | ErrorKind::InternalError => {
            StatusCode::INTERNAL_SERVER_ERROR
        },
    }
}

fn failure_body(failure: &PipelineFailure) -> ErrorResponse {
    let kind = failure.kind();
    let mut body = ErrorResponse::bare(String::new(), kind, failure.stage_reached);
    body.partial = PartialResult::from_result(&failure.partial);

    body.error = match &failure.error {
        ApplicationError::Domain(e) => e.to_string(),
        ApplicationError::Validation(msg) => msg.clone(),
        ApplicationError::RateLimited {
            request_type,
            retry_after_secs,
        } => {
            body.retry_after = Some(*retry_after_secs);
            body.request_type = Some(*request_type);
            format!("Rate limit exceeded for {request_type}")
        },
        ApplicationError::Provider(e) => {
            body.transient = Some(e.is_transient());
            body.provider = Some(e.provider.clone());
            format!("{} provider failed ({})", e.provider, e.kind)
        },
        ApplicationError::CounterStore(detail) => {
            error!(error = %detail, "Counter store unavailable");
            "Rate limit store unavailable".to_string()
        },
        ApplicationError::Storage(detail) => {
            error!(error = %detail, "Object storage failed");
            "Audio storage unavailable".to_string()
        },
        ApplicationError::Configuration(detail) | ApplicationError::Internal(detail) => {
            error!(error = %detail, "Internal error");
            "Internal error".to_string()
        },
    };
    body
}

impl ApiError {
    /// Rendered status and body
    #[must_use]
    pub fn to_parts(&self) -> (StatusCode, ErrorResponse) {
        let body = match self {
            Self::Validation(msg) => ErrorResponse::bare(
                msg.clone(),
                ErrorKind::ValidationError,
                PipelineStage::Received,
            ),
            Self::Pipeline(failure) => failure_body(failure),
        };
        (status_for(body.error_kind), body)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_parts();
        let retry_after = body.retry_after;

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use application::ProviderError;
    use domain::AsrProvider;

    use super::*;

    #[test]
    fn validation_is_bad_request_at_received() {
        let (status, body) = ApiError::Validation("X-Session-Id is required".into()).to_parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error_kind, ErrorKind::ValidationError);
        assert_eq!(body.stage_reached, PipelineStage::Received);
    }

    #[test]
    fn rate_limit_carries_retry_after() {
        let failure = PipelineFailure {
            error: ApplicationError::RateLimited {
                request_type: RequestType::Tts,
                retry_after_secs: 42,
            },
            stage_reached: PipelineStage::RateChecked,
            partial: PipelineResult::new(),
        };
        let response = ApiError::from(failure).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "42");
    }

    #[test]
    fn provider_failure_keeps_partial_transcript() {
        let mut partial = PipelineResult::new();
        partial.transcript = Some("kheti".to_string());
        partial.provider_used.asr = Some(AsrProvider::Whisper);
        let failure = PipelineFailure {
            error: ProviderError::transient("rag", "status 503").into(),
            stage_reached: PipelineStage::RetrieveGenerate,
            partial,
        };

        let (status, body) = ApiError::from(failure).to_parts();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.transient, Some(true));
        assert_eq!(body.provider.as_deref(), Some("rag"));
        assert_eq!(
            body.partial,
            Some(PartialResult {
                transcribed_text: Some("kheti".to_string()),
                rag_response: None,
            })
        );
    }

    #[test]
    fn store_details_are_not_exposed() {
        let err = ApiError::from(ApplicationError::CounterStore(
            "unable to open database file /var/lib/voice/limits.db".into(),
        ));
        let (status, body) = err.to_parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error_kind, ErrorKind::CounterStoreError);
        assert!(!body.error.contains("/var/lib"));
    }

    #[test]
    fn optional_fields_are_omitted() {
        let (_, body) = ApiError::Validation("bad".into()).to_parts();
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "error": "bad",
                "error_kind": "validation_error",
                "stage_reached": "received"
            })
        );
    }
}
