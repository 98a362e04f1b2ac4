//! OpenAI Speech Provider
//!
//! Implements `SpeechToText` using OpenAI Whisper and `TextToSpeech` using OpenAI TTS.
//!
//! # Supported Audio Formats
//!
//! ## STT (Whisper)
//! - mp3, mp4, mpeg, mpga, m4a, wav, webm, ogg, flac
//!
//! ## TTS
//! - mp3 only; long text is synthesized in sentence-aligned chunks and the
//!   mp3 frames are concatenated

use std::time::Duration;

use async_trait::async_trait;
use domain::{AudioFormat, Language};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::chunking::split_for_tts;
use crate::config::OpenAiSpeechConfig;
use crate::error::SpeechError;
use crate::ports::{SpeechToText, TextToSpeech};
use crate::types::{AudioData, Transcription};

/// OpenAI speech provider implementing both STT and TTS
#[derive(Debug, Clone)]
pub struct OpenAISpeechProvider {
    client: Client,
    config: OpenAiSpeechConfig,
}

impl OpenAISpeechProvider {
    /// Create a new OpenAI speech provider
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Configuration` if the configuration is invalid.
    pub fn new(config: OpenAiSpeechConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Configuration)?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                SpeechError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    fn api_key(&self) -> &str {
        self.config.api_key.as_deref().unwrap_or_default()
    }

    fn stt_url(&self) -> String {
        format!("{}/audio/transcriptions", self.config.base_url)
    }

    fn tts_url(&self) -> String {
        format!("{}/audio/speech", self.config.base_url)
    }

    /// Turn a non-success response into a classified error
    async fn error_from_response(
        response: reqwest::Response,
        wrap: fn(String) -> SpeechError,
    ) -> SpeechError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if let Ok(api_error) = serde_json::from_str::<ApiError>(&body) {
            if api_error.error.code.as_deref() == Some("rate_limit_exceeded") {
                return SpeechError::RateLimited;
            }
            if status.is_client_error() && status != reqwest::StatusCode::TOO_MANY_REQUESTS {
                return wrap(api_error.error.message);
            }
            return SpeechError::from_status(status, api_error.error.message);
        }

        SpeechError::from_status(status, body)
    }

    async fn synthesize_chunk(&self, chunk: &str) -> Result<Vec<u8>, SpeechError> {
        let request = TtsRequest {
            model: &self.config.tts_model,
            input: chunk,
            voice: &self.config.voice,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(self.tts_url())
            .bearer_auth(self.api_key())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, SpeechError::SynthesisFailed).await);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SpeechError::InvalidResponse(format!("Failed to read audio: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// OpenAI Whisper transcription response
#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
    #[serde(default)]
    duration: Option<f64>,
}

/// OpenAI TTS request body
#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// OpenAI API error response
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

#[async_trait]
impl SpeechToText for OpenAISpeechProvider {
    #[instrument(skip_all, fields(audio_size = audio.size_bytes(), format = %audio.format(), language = %language))]
    async fn transcribe(
        &self,
        audio: AudioData,
        language: Language,
    ) -> Result<Transcription, SpeechError> {
        debug!("Transcribing audio with OpenAI Whisper");

        if audio.is_empty() {
            return Err(SpeechError::InvalidAudio("Audio data is empty".to_string()));
        }

        let filename = audio.filename("audio");
        let mime_type = audio.mime_type();
        let data = audio.into_data();

        let file_part = Part::bytes(data)
            .file_name(filename)
            .mime_str(mime_type)
            .map_err(|e| SpeechError::InvalidAudio(format!("Invalid MIME type: {e}")))?;

        let form = Form::new()
            .part("file", file_part)
            .text("model", self.config.stt_model.clone())
            .text("language", language.code().to_string());

        let response = self
            .client
            .post(self.stt_url())
            .bearer_auth(self.api_key())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(
                Self::error_from_response(response, SpeechError::TranscriptionFailed).await,
            );
        }

        let whisper_response: WhisperResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        debug!(
            text_len = whisper_response.text.len(),
            "Transcription complete"
        );

        let mut transcription =
            Transcription::new(whisper_response.text).with_language(language.code());

        if let Some(duration) = whisper_response.duration {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let duration_ms = (duration * 1000.0) as u64;
            transcription = transcription.with_duration(duration_ms);
        }

        Ok(transcription)
    }

    fn model_name(&self) -> &str {
        &self.config.stt_model
    }
}

#[async_trait]
impl TextToSpeech for OpenAISpeechProvider {
    #[instrument(skip_all, fields(text_len = text.chars().count(), language = %language))]
    async fn synthesize(&self, text: &str, language: Language) -> Result<AudioData, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::SynthesisFailed(
                "Text cannot be empty".to_string(),
            ));
        }

        let chunks = split_for_tts(text, self.config.max_tts_chunk_chars);
        debug!(chunks = chunks.len(), "Synthesizing speech with OpenAI TTS");

        let mut audio = Vec::new();
        for chunk in &chunks {
            audio.extend(self.synthesize_chunk(chunk).await?);
        }

        if audio.is_empty() {
            return Err(SpeechError::InvalidResponse(
                "TTS returned no audio".to_string(),
            ));
        }

        debug!(audio_size = audio.len(), "Speech synthesis complete");
        Ok(AudioData::new(audio, AudioFormat::Mp3))
    }

    fn model_name(&self) -> &str {
        &self.config.tts_model
    }
}
