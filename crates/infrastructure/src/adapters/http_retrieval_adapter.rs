//! HTTP retrieval adapter - Implements RetrievalPort against a RAG service
//!
//! Sends `GET {url}?query=<question>` and reads the answer from the JSON
//! `answer` or `response` field, falling back to the raw body.

use std::time::Duration;

use application::{
    error::ProviderError,
    ports::{Answer, RetrievalPort},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::RagConfig;

const PROVIDER: &str = "rag";

#[derive(Debug, Deserialize)]
struct RagResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    response: Option<String>,
}

/// Retrieval-and-generation backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpRetrievalAdapter {
    client: Client,
    url: String,
}

impl HttpRetrievalAdapter {
    /// Create an adapter for the configured endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to initialize.
    pub fn new(config: &RagConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("voice-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    fn classify_status(status: StatusCode, body: &str) -> ProviderError {
        let excerpt: String = body.chars().take(200).collect();
        let message = format!("status {status}: {excerpt}");
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            ProviderError::transient(PROVIDER, message)
        } else {
            ProviderError::permanent(PROVIDER, message)
        }
    }

    fn extract_answer(body: String) -> String {
        match serde_json::from_str::<RagResponse>(&body) {
            Ok(RagResponse {
                answer: Some(text), ..
            })
            | Ok(RagResponse {
                response: Some(text),
                ..
            }) => text,
            _ => body,
        }
    }
}

#[async_trait]
impl RetrievalPort for HttpRetrievalAdapter {
    #[instrument(skip_all, fields(question_len = question.len()))]
    async fn retrieve_and_generate(&self, question: &str) -> Result<Answer, ProviderError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("query", question)])
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Retrieval request failed");
                if e.is_timeout() || e.is_connect() || e.is_request() {
                    ProviderError::transient(PROVIDER, e.to_string())
                } else {
                    ProviderError::permanent(PROVIDER, e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::transient(PROVIDER, e.to_string()))?;

        if !status.is_success() {
            return Err(Self::classify_status(status, &body));
        }

        let text = Self::extract_answer(body);
        debug!(answer_len = text.len(), "Retrieval answered");
        Ok(Answer { text })
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    use super::*;
    use application::ProviderErrorKind;

    fn adapter(server: &MockServer) -> HttpRetrievalAdapter {
        HttpRetrievalAdapter::new(&RagConfig {
            url: format!("{}/query", server.uri()),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn reads_answer_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("query", "when to sow paddy"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"answer": "Sow after the first rains."})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let answer = adapter(&server)
            .retrieve_and_generate("when to sow paddy")
            .await
            .unwrap();
        assert_eq!(answer.text, "Sow after the first rains.");
    }

    #[tokio::test]
    async fn reads_response_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"response": "Yes."})),
            )
            .mount(&server)
            .await;

        let answer = adapter(&server).retrieve_and_generate("q").await.unwrap();
        assert_eq!(answer.text, "Yes.");
    }

    #[tokio::test]
    async fn plain_body_is_the_answer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Irrigate weekly."))
            .mount(&server)
            .await;

        let answer = adapter(&server).retrieve_and_generate("q").await.unwrap();
        assert_eq!(answer.text, "Irrigate weekly.");
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = adapter(&server).retrieve_and_generate("q").await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Transient);
        assert_eq!(err.provider, "rag");
    }

    #[tokio::test]
    async fn client_error_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad query"))
            .mount(&server)
            .await;

        let err = adapter(&server).retrieve_and_generate("q").await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Permanent);
        assert!(err.message.contains("bad query"));
    }

    #[tokio::test]
    async fn unreachable_backend_is_transient() {
        let adapter = HttpRetrievalAdapter::new(&RagConfig {
            url: "http://127.0.0.1:9/query".to_string(),
            timeout_secs: 2,
        })
        .unwrap();

        let err = adapter.retrieve_and_generate("q").await.unwrap_err();
        assert!(err.is_transient());
    }
}
