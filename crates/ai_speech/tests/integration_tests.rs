//! Integration tests for ai_speech crate
//!
//! Tests the speech round trip with mocked OpenAI APIs.

use ai_speech::{AudioData, OpenAISpeechProvider, OpenAiSpeechConfig, SpeechToText, TextToSpeech};
use domain::{AudioFormat, Language};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Create a test configuration pointing to mock server
fn test_config(base_url: &str) -> OpenAiSpeechConfig {
    OpenAiSpeechConfig {
        api_key: Some("test-api-key".to_string()),
        base_url: base_url.to_string(),
        timeout_ms: 5000,
        ..Default::default()
    }
}

/// Minimal MP3 frame header
fn mock_mp3_audio() -> Vec<u8> {
    vec![
        0xFF, 0xFB, 0x90, 0x00, // MP3 frame header
        0x00, 0x00, 0x00, 0x00, // Padding
    ]
}

#[tokio::test]
async fn odia_question_round_trip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .and(header("Authorization", "Bearer test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "text": "ଧାନ ପାଇଁ କେତେ ପାଣି ଦରକାର?"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/audio/speech"))
        .and(body_string_contains("tts-1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(mock_mp3_audio()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider =
        OpenAISpeechProvider::new(test_config(&mock_server.uri())).expect("provider config");

    let transcription = provider
        .transcribe(
            AudioData::new(vec![1, 2, 3, 4], AudioFormat::Webm),
            Language::Odia,
        )
        .await
        .expect("transcription");
    assert_eq!(transcription.text, "ଧାନ ପାଇଁ କେତେ ପାଣି ଦରକାର?");
    assert_eq!(transcription.language.as_deref(), Some("or"));

    let speech = provider
        .synthesize("ସପ୍ତାହରେ ଦୁଇଥର ପାଣି ଦିଅନ୍ତୁ।", Language::Odia)
        .await
        .expect("synthesis");
    assert_eq!(speech.format(), AudioFormat::Mp3);
    assert_eq!(speech.data(), mock_mp3_audio().as_slice());
}

#[tokio::test]
async fn long_answer_is_chunked_in_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/audio/speech"))
        .and(body_string_contains("First sentence"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 4]))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/audio/speech"))
        .and(body_string_contains("Second sentence"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![2u8; 4]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = OpenAiSpeechConfig {
        max_tts_chunk_chars: 25,
        ..test_config(&mock_server.uri())
    };
    let provider = OpenAISpeechProvider::new(config).expect("provider config");

    let speech = provider
        .synthesize("First sentence here. Second sentence here.", Language::Odia)
        .await
        .expect("synthesis");

    assert_eq!(speech.data(), &[1, 1, 1, 1, 2, 2, 2, 2]);
}

#[tokio::test]
async fn unauthorized_is_permanent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/audio/speech"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider =
        OpenAISpeechProvider::new(test_config(&mock_server.uri())).expect("provider config");

    let err = provider
        .synthesize("hello", Language::Odia)
        .await
        .expect_err("401 must fail");
    assert!(!err.is_transient());
}

#[tokio::test]
async fn unreachable_endpoint_is_transient() {
    // Nothing listens on port 9 on test hosts
    let provider =
        OpenAISpeechProvider::new(test_config("http://127.0.0.1:9")).expect("provider config");

    let err = provider
        .transcribe(AudioData::new(vec![1], AudioFormat::Wav), Language::Odia)
        .await
        .expect_err("connection must fail");
    assert!(err.is_transient());
}
