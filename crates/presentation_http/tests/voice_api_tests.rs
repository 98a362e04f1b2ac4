//! HTTP surface tests
//!
//! The router runs over in-memory adapters, scripted speech and retrieval
//! backends and a manual clock.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{sync::Arc, time::Duration};

use application::{
    Answer, AsrBackend, AsrOutput, Clock, LifecycleConfig, ManualClock, ObjectLifecycleManager,
    ObjectStorePort, PipelineConfig, ProviderError, ProviderRouter, RateLimitPolicy, RateLimiter,
    RetrievalPort, RetryPolicy, RouterConfig, RoutingTable, TtsBackend, TtsOutput,
    VoicePipelineService,
};
use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::{TimeDelta, TimeZone, Utc};
use domain::{AsrProvider, AudioFormat, Language, ObjectKey, TtsProvider};
use infrastructure::{AppConfig, MemoryObjectStore, MokaCounterStore};
use presentation_http::{AppState, create_router};
use serde_json::{Value, json};

const SESSION: HeaderName = HeaderName::from_static("x-session-id");
const LANGUAGE: HeaderName = HeaderName::from_static("x-language");
const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

struct FakeAsr(AsrProvider);

#[async_trait]
impl AsrBackend for FakeAsr {
    fn provider(&self) -> AsrProvider {
        self.0
    }

    async fn transcribe(
        &self,
        _audio: &ObjectKey,
        _language: Language,
    ) -> Result<AsrOutput, ProviderError> {
        Ok(AsrOutput {
            text: "when should I sow paddy".to_string(),
            confidence: Some(0.9),
            provider: self.0,
        })
    }
}

struct FakeTts(TtsProvider);

#[async_trait]
impl TtsBackend for FakeTts {
    fn provider(&self) -> TtsProvider {
        self.0
    }

    async fn synthesize(&self, _text: &str, _language: Language) -> Result<TtsOutput, ProviderError> {
        Ok(TtsOutput {
            audio: vec![0x49, 0x44, 0x33, 0x04],
            format: AudioFormat::Mp3,
            provider: self.0,
        })
    }
}

enum Retrieval {
    Answers,
    Unavailable,
}

#[async_trait]
impl RetrievalPort for Retrieval {
    async fn retrieve_and_generate(&self, _question: &str) -> Result<Answer, ProviderError> {
        match self {
            Self::Answers => Ok(Answer {
                text: "Sow paddy after the first monsoon rains in June".to_string(),
            }),
            Self::Unavailable => Err(ProviderError::transient("rag", "status 503")),
        }
    }
}

struct Harness {
    server: TestServer,
    clock: Arc<ManualClock>,
    objects: Arc<MemoryObjectStore>,
}

fn harness(retrieval: Retrieval) -> Harness {
    let start = Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let objects = Arc::new(MemoryObjectStore::new("test-audio"));

    let router = ProviderRouter::new(
        RoutingTable::default(),
        RouterConfig {
            call_timeout: Duration::from_secs(5),
            retry: RetryPolicy::once(Duration::from_millis(1)),
        },
    )
    .with_asr_backend(Arc::new(FakeAsr(AsrProvider::Transcribe)))
    .with_asr_backend(Arc::new(FakeAsr(AsrProvider::Whisper)))
    .with_tts_backend(Arc::new(FakeTts(TtsProvider::Polly)))
    .with_tts_backend(Arc::new(FakeTts(TtsProvider::OpenAi)));

    let limiter = RateLimiter::new(
        Arc::new(MokaCounterStore::new(1_000)),
        Arc::clone(&clock) as Arc<dyn Clock>,
        RateLimitPolicy::default(),
    );
    let lifecycle = ObjectLifecycleManager::new(
        Arc::clone(&objects) as Arc<dyn ObjectStorePort>,
        LifecycleConfig::default(),
    );
    let pipeline = VoicePipelineService::with_config(
        Arc::new(limiter),
        Arc::new(router),
        Arc::new(retrieval),
        Arc::new(lifecycle),
        PipelineConfig {
            retrieval_timeout: Duration::from_secs(5),
            retrieval_retry: RetryPolicy::once(Duration::from_millis(1)),
        },
    );

    let app = create_router(AppState::new(pipeline, AppConfig::default()));
    Harness {
        server: TestServer::new(app).expect("Failed to create test server"),
        clock,
        objects,
    }
}

fn header(value: &'static str) -> HeaderValue {
    HeaderValue::from_static(value)
}

impl Harness {
    async fn upload(&self, key: &str) -> ObjectKey {
        let key = ObjectKey::upload_ref(key).unwrap();
        self.objects
            .put(&key, vec![0; 128], "audio/wav")
            .await
            .unwrap();
        key
    }

    async fn status(&self, session: &'static str) -> Value {
        let response = self
            .server
            .get("/voice/rate-limit-status")
            .add_header(SESSION, header(session))
            .await;
        response.assert_status_ok();
        response.json::<Value>()
    }
}

#[tokio::test]
async fn health_and_ready() {
    let h = harness(Retrieval::Answers);

    let response = h.server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ok");

    let response = h.server.get("/ready").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ready");
}

#[tokio::test]
async fn asr_counts_down_then_returns_429() {
    let h = harness(Retrieval::Answers);

    for expected_remaining in (0..5).rev() {
        let key = h.upload(&format!("uploads/farmer-1/clip-{expected_remaining}.wav")).await;
        let response = h
            .server
            .post("/voice/asr")
            .add_header(SESSION, header("farmer-1"))
            .add_header(LANGUAGE, header("hi"))
            .json(&json!({ "audio_ref": key.as_str() }))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["text"], "when should I sow paddy");
        assert_eq!(body["provider"], "transcribe");
        assert_eq!(body["language"], "hi");
        assert_eq!(body["rate_limit"]["remaining"], expected_remaining);
        assert_eq!(body["rate_limit"]["reset_in_seconds"], 3600);
        assert!(!h.objects.contains(&key));
    }

    h.clock.advance(TimeDelta::seconds(600));
    let key = h.upload("uploads/farmer-1/clip-refused.wav").await;
    let response = h
        .server
        .post("/voice/asr")
        .add_header(SESSION, header("farmer-1"))
        .add_header(LANGUAGE, header("hi"))
        .json(&json!({ "audio_ref": key.as_str() }))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response.headers().get("retry-after").unwrap(),
        "3000"
    );
    let body = response.json::<Value>();
    assert_eq!(body["error_kind"], "rate_limit_exceeded");
    assert_eq!(body["stage_reached"], "rate_checked");
    assert_eq!(body["request_type"], "asr");
    assert_eq!(body["retry_after"], 3000);
    assert!(body.get("partial").is_none());
    // Refused before transcription, so the upload is untouched
    assert!(h.objects.contains(&key));
}

#[tokio::test]
async fn window_resets_after_an_hour() {
    let h = harness(Retrieval::Answers);

    for i in 0..5 {
        let key = h.upload(&format!("uploads/farmer-2/{i}.wav")).await;
        h.server
            .post("/voice/asr")
            .add_header(SESSION, header("farmer-2"))
            .json(&json!({ "audio_ref": key.as_str() }))
            .await
            .assert_status_ok();
    }

    h.clock.advance(TimeDelta::seconds(3601));
    let key = h.upload("uploads/farmer-2/after-reset.wav").await;
    let response = h
        .server
        .post("/voice/asr")
        .add_header(SESSION, header("farmer-2"))
        .json(&json!({ "audio_ref": key.as_str() }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["rate_limit"]["remaining"], 4);
}

#[tokio::test]
async fn tts_quota_is_independent_of_asr() {
    let h = harness(Retrieval::Answers);

    for i in 0..5 {
        let key = h.upload(&format!("uploads/farmer-3/{i}.wav")).await;
        h.server
            .post("/voice/asr")
            .add_header(SESSION, header("farmer-3"))
            .json(&json!({ "audio_ref": key.as_str() }))
            .await
            .assert_status_ok();
    }

    let response = h
        .server
        .post("/voice/tts")
        .add_header(SESSION, header("farmer-3"))
        .json(&json!({ "text": "Irrigate twice a week" }))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["provider"], "polly");
    assert_eq!(body["rate_limit"]["remaining"], 4);
    assert!(
        body["audio_url"]
            .as_str()
            .unwrap()
            .starts_with("memory://test-audio/responses/farmer-3/")
    );
    assert!(body.get("audio_base64").is_none());

    let status = h.status("farmer-3").await;
    assert_eq!(status["max_requests_per_window"], 5);
    assert_eq!(status["asr"]["allowed"], false);
    assert_eq!(status["asr"]["current_count"], 5);
    assert_eq!(status["tts"]["allowed"], true);
    assert_eq!(status["tts"]["current_count"], 1);
}

#[tokio::test]
async fn tts_can_return_inline_audio() {
    let h = harness(Retrieval::Answers);

    let response = h
        .server
        .post("/voice/tts")
        .add_header(SESSION, header("farmer-4"))
        .add_header(LANGUAGE, header("or"))
        .json(&json!({ "text": "ଧାନ ଚାଷ", "return_url": false }))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["provider"], "openai");
    assert_eq!(body["language"], "or");
    assert_eq!(body["audio_base64"], "SUQzBA==");
    assert!(body.get("audio_url").is_none());
    assert!(h.objects.is_empty());
}

#[tokio::test]
async fn ask_runs_every_stage() {
    let h = harness(Retrieval::Answers);
    let key = h.upload("uploads/farmer-5/question.webm").await;

    let response = h
        .server
        .post("/voice/ask")
        .add_header(SESSION, header("farmer-5"))
        .add_header(LANGUAGE, header("or"))
        .json(&json!({ "audio_ref": key.as_str() }))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["transcribed_text"], "when should I sow paddy");
    assert_eq!(
        body["rag_response"],
        "Sow paddy after the first monsoon rains in June"
    );
    assert_eq!(body["asr_provider"], "whisper");
    assert_eq!(body["tts_provider"], "openai");
    assert!(
        body["audio_url"]
            .as_str()
            .unwrap()
            .contains("/responses/farmer-5/")
    );
    assert!(!h.objects.contains(&key));

    let status = h.status("farmer-5").await;
    assert_eq!(status["asr"]["current_count"], 1);
    assert_eq!(status["tts"]["current_count"], 1);
}

#[tokio::test]
async fn ask_retrieval_failure_is_502_with_partial_result() {
    let h = harness(Retrieval::Unavailable);
    let key = h.upload("uploads/farmer-6/question.wav").await;

    let response = h
        .server
        .post("/voice/ask")
        .add_header(SESSION, header("farmer-6"))
        .json(&json!({ "audio_ref": key.as_str() }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body = response.json::<Value>();
    assert_eq!(body["error_kind"], "provider_error");
    assert_eq!(body["stage_reached"], "retrieve_generate");
    assert_eq!(body["provider"], "rag");
    assert_eq!(body["transient"], true);
    assert_eq!(
        body["partial"]["transcribed_text"],
        "when should I sow paddy"
    );
    assert_eq!(body["partial"]["rag_response"], Value::Null);

    // Source audio is gone, ASR quota is spent, TTS quota untouched
    assert!(!h.objects.contains(&key));
    let status = h.status("farmer-6").await;
    assert_eq!(status["asr"]["current_count"], 1);
    assert_eq!(status["asr"]["remaining"], 4);
    assert_eq!(status["tts"]["current_count"], 0);
}

#[tokio::test]
async fn validation_failures_consume_nothing() {
    let h = harness(Retrieval::Answers);
    let key = h.upload("uploads/farmer-7/a.wav").await;

    let missing_session = h
        .server
        .post("/voice/asr")
        .json(&json!({ "audio_ref": key.as_str() }))
        .await;
    missing_session.assert_status_bad_request();
    let body = missing_session.json::<Value>();
    assert_eq!(body["error_kind"], "validation_error");
    assert_eq!(body["stage_reached"], "received");

    let unknown_language = h
        .server
        .post("/voice/asr")
        .add_header(SESSION, header("farmer-7"))
        .add_header(LANGUAGE, header("fr"))
        .json(&json!({ "audio_ref": key.as_str() }))
        .await;
    unknown_language.assert_status_bad_request();

    let unknown_field = h
        .server
        .post("/voice/asr")
        .add_header(SESSION, header("farmer-7"))
        .json(&json!({ "audio_ref": key.as_str(), "priority": "high" }))
        .await;
    unknown_field.assert_status_bad_request();

    let not_an_upload = h
        .server
        .post("/voice/ask")
        .add_header(SESSION, header("farmer-7"))
        .json(&json!({ "audio_ref": "responses/farmer-7/a.mp3" }))
        .await;
    not_an_upload.assert_status_bad_request();

    let blank_text = h
        .server
        .post("/voice/tts")
        .add_header(SESSION, header("farmer-7"))
        .json(&json!({ "text": "   " }))
        .await;
    blank_text.assert_status_bad_request();

    let too_long = h
        .server
        .post("/voice/tts")
        .add_header(SESSION, header("farmer-7"))
        .json(&json!({ "text": "a".repeat(5001) }))
        .await;
    too_long.assert_status_bad_request();

    assert!(h.objects.contains(&key));
    let status = h.status("farmer-7").await;
    assert_eq!(status["asr"]["current_count"], 0);
    assert_eq!(status["tts"]["current_count"], 0);
}

#[tokio::test]
async fn upload_url_issues_a_session_key() {
    let h = harness(Retrieval::Answers);

    let response = h
        .server
        .get("/voice/upload-url")
        .add_query_param("file_type", "mp3")
        .add_header(SESSION, header("farmer-8"))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["content_type"], "audio/mpeg");
    assert_eq!(body["expires_in"], 300);
    let key = body["object_key"].as_str().unwrap();
    assert!(key.starts_with("uploads/farmer-8/"));
    assert!(key.ends_with(".mp3"));
    assert!(body["upload_url"].as_str().unwrap().contains(key));

    let default_format = h
        .server
        .get("/voice/upload-url")
        .add_header(SESSION, header("farmer-8"))
        .await;
    default_format.assert_status_ok();
    assert_eq!(default_format.json::<Value>()["content_type"], "audio/wav");

    h.server
        .get("/voice/upload-url")
        .add_query_param("file_type", "aiff")
        .add_header(SESSION, header("farmer-8"))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn request_id_is_echoed_or_generated() {
    let h = harness(Retrieval::Answers);
    let id = "0192f0c1-7d3e-7a11-9c4b-5d2f8e6a1b00";

    let echoed = h
        .server
        .get("/health")
        .add_header(REQUEST_ID, header(id))
        .await;
    assert_eq!(echoed.headers().get("x-request-id").unwrap(), id);

    let rejected = h.server.post("/voice/tts").json(&json!({ "text": "hi" })).await;
    rejected.assert_status_bad_request();
    let generated = rejected
        .headers()
        .get("x-request-id")
        .unwrap()
        .to_str()
        .unwrap();
    assert_eq!(uuid::Uuid::parse_str(generated).unwrap().get_version_num(), 7);
}
