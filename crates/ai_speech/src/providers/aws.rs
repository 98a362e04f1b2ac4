//! Shared plumbing for the AWS speech providers

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_polly::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use tracing::warn;

use crate::error::SpeechError;

const THROTTLING_CODES: &[&str] = &[
    "ThrottlingException",
    "Throttling",
    "TooManyRequestsException",
    "LimitExceededException",
];

const UNAVAILABLE_CODES: &[&str] = &[
    "ServiceFailureException",
    "InternalFailureException",
    "InternalFailure",
    "ServiceUnavailable",
    "ServiceUnavailableException",
];

/// Load AWS settings from the default provider chain for `region`
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

/// Map an SDK failure to a classified `SpeechError`
pub(crate) fn classify_sdk_error<E, R>(service: &str, err: &SdkError<E, R>) -> SpeechError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let detail = format!("{service}: {}", DisplayErrorContext(err));
    warn!(service, error = %detail, "AWS call failed");

    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            SpeechError::ConnectionFailed(detail)
        },
        SdkError::ResponseError(_) => SpeechError::ServiceUnavailable(detail),
        SdkError::ServiceError(context) => classify_code(context.err().code(), detail),
        _ => SpeechError::RequestFailed(detail),
    }
}

/// Classify an AWS error code
fn classify_code(code: Option<&str>, detail: String) -> SpeechError {
    match code {
        Some(code) if THROTTLING_CODES.contains(&code) => SpeechError::RateLimited,
        Some(code) if UNAVAILABLE_CODES.contains(&code) => SpeechError::ServiceUnavailable(detail),
        _ => SpeechError::RequestFailed(detail),
    }
}
