//! Request validation
//!
//! [`ValidatedJson`] validates request bodies with the validator crate.
//! [`VoiceHeaders`] reads the session and language every voice route needs.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Query, Request,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, request::Parts},
};
use domain::{Language, SessionId};
use serde::{Deserialize, de::DeserializeOwned};
use validator::{Validate, ValidationErrors};

use crate::error::ApiError;

/// Session header
pub const SESSION_HEADER: &str = "X-Session-Id";

/// Language header
pub const LANGUAGE_HEADER: &str = "X-Language";

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(format!("Invalid JSON: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

fn describe(errors: &ValidationErrors) -> String {
    let mut lines: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                format!(
                    "{}: {}",
                    field,
                    error
                        .message
                        .as_ref()
                        .map_or_else(|| error.code.to_string(), ToString::to_string)
                )
            })
        })
        .collect();
    lines.sort();
    lines.join("; ")
}

/// A JSON extractor that also validates the request body
///
/// ```ignore
/// async fn handler(ValidatedJson(req): ValidatedJson<TtsBody>) { .. }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value
            .validate()
            .map_err(|e| ApiError::Validation(describe(&e)))?;
        Ok(Self(value))
    }
}

/// Session and language of a voice request
///
/// Headers win; `session_id` and `language` query parameters are accepted
/// as a fallback for clients that cannot set headers. A missing language
/// means English.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceHeaders {
    pub session: SessionId,
    pub language: Language,
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Query fallback for clients that cannot set headers
#[derive(Debug, Default, Deserialize)]
struct VoiceQuery {
    session_id: Option<String>,
    language: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl VoiceHeaders {
    /// Resolve from request parts
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for a missing or malformed session id
    /// or an unsupported language.
    pub fn from_parts(parts: &Parts) -> Result<Self, ApiError> {
        let Query(query) = Query::<VoiceQuery>::try_from_uri(&parts.uri)?;

        let session = header_value(&parts.headers, SESSION_HEADER)
            .map(ToString::to_string)
            .or_else(|| non_empty(query.session_id))
            .ok_or_else(|| ApiError::Validation(format!("{SESSION_HEADER} is required")))?;
        let session = SessionId::new(session)?;

        let language = match header_value(&parts.headers, LANGUAGE_HEADER)
            .map(ToString::to_string)
            .or_else(|| non_empty(query.language))
        {
            Some(code) => Language::parse(&code)?,
            None => Language::English,
        };

        Ok(Self { session, language })
    }
}

impl<S> FromRequestParts<S> for VoiceHeaders
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts)
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::post,
    };
    use serde::Deserialize;
    use tower::ServiceExt;
    use validator::Validate;

    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct TestRequest {
        #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
        message: String,
    }

    async fn test_handler(ValidatedJson(req): ValidatedJson<TestRequest>) -> String {
        req.message
    }

    fn create_test_app() -> Router {
        Router::new().route("/test", post(test_handler))
    }

    fn json_request(body: &'static str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri("/test")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    fn parts(uri: &str, headers: &[(&str, &str)]) -> Parts {
        let mut builder = HttpRequest::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn valid_request_passes() {
        let response = create_test_app()
            .oneshot(json_request(r#"{"message": "hello"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn empty_message_rejected() {
        let response = create_test_app()
            .oneshot(json_request(r#"{"message": ""}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_json_rejected() {
        let response = create_test_app()
            .oneshot(json_request(r#"{"message": not valid json}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn headers_are_read() {
        let voice = VoiceHeaders::from_parts(&parts(
            "/voice/asr",
            &[(SESSION_HEADER, "farmer-1"), (LANGUAGE_HEADER, "hi")],
        ))
        .unwrap();
        assert_eq!(voice.session.as_str(), "farmer-1");
        assert_eq!(voice.language, Language::Hindi);
    }

    #[test]
    fn language_defaults_to_english() {
        let voice =
            VoiceHeaders::from_parts(&parts("/voice/asr", &[(SESSION_HEADER, "farmer-1")]))
                .unwrap();
        assert_eq!(voice.language, Language::English);
    }

    #[test]
    fn query_is_a_fallback() {
        let voice = VoiceHeaders::from_parts(&parts(
            "/voice/rate-limit-status?session_id=farmer-2&language=or",
            &[],
        ))
        .unwrap();
        assert_eq!(voice.session.as_str(), "farmer-2");
        assert_eq!(voice.language, Language::Odia);

        let voice = VoiceHeaders::from_parts(&parts(
            "/voice/rate-limit-status?session_id=from-query",
            &[(SESSION_HEADER, "from-header")],
        ))
        .unwrap();
        assert_eq!(voice.session.as_str(), "from-header");
    }

    #[test]
    fn query_values_are_percent_decoded() {
        let header = VoiceHeaders::from_parts(&parts(
            "/voice/rate-limit-status",
            &[(SESSION_HEADER, "farmer@x")],
        ))
        .unwrap();
        let query = VoiceHeaders::from_parts(&parts(
            "/voice/rate-limit-status?session_id=farmer%40x&language=%20hi+",
            &[],
        ))
        .unwrap();
        assert_eq!(query.session, header.session);
        assert_eq!(query.language, Language::Hindi);
    }

    #[test]
    fn missing_session_is_rejected() {
        let err = VoiceHeaders::from_parts(&parts("/voice/asr", &[])).unwrap_err();
        assert!(err.to_string().contains(SESSION_HEADER));
    }

    #[test]
    fn unknown_language_is_rejected() {
        let err = VoiceHeaders::from_parts(&parts(
            "/voice/asr",
            &[(SESSION_HEADER, "farmer-1"), (LANGUAGE_HEADER, "fr")],
        ))
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
