//! Amazon Transcribe speech-to-text
//!
//! Runs a batch job against audio already in S3: start the job, poll until
//! it completes or fails, fetch the transcript document and delete the job.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_transcribe::{
    Client,
    types::{LanguageCode, Media, MediaFormat, TranscriptionJobStatus},
};
use domain::{AudioFormat, Language};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::aws::classify_sdk_error;
use crate::config::AwsSpeechConfig;
use crate::error::SpeechError;
use crate::ports::StoredAudioTranscriber;
use crate::types::Transcription;

/// Transcribe-backed STT
#[derive(Debug, Clone)]
pub struct TranscribeSpeechProvider {
    client: Client,
    http: reqwest::Client,
    poll_interval: Duration,
    job_timeout: Duration,
}

/// Transcript document written by a completed job
#[derive(Debug, Deserialize)]
struct TranscriptDocument {
    results: TranscriptResults,
}

#[derive(Debug, Deserialize)]
struct TranscriptResults {
    #[serde(default)]
    transcripts: Vec<TranscriptText>,
}

#[derive(Debug, Deserialize)]
struct TranscriptText {
    transcript: String,
}

impl TranscriptDocument {
    fn into_text(self) -> String {
        self.results
            .transcripts
            .into_iter()
            .next()
            .map(|t| t.transcript)
            .unwrap_or_default()
    }
}

impl TranscribeSpeechProvider {
    pub fn new(sdk_config: &SdkConfig, config: &AwsSpeechConfig) -> Self {
        Self::from_client(Client::new(sdk_config), config)
    }

    pub fn from_client(client: Client, config: &AwsSpeechConfig) -> Self {
        Self {
            client,
            http: reqwest::Client::new(),
            poll_interval: Duration::from_millis(config.transcribe_poll_interval_ms),
            job_timeout: Duration::from_secs(config.transcribe_job_timeout_secs),
        }
    }

    /// Transcribe language code for `language`
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::UnsupportedLanguage` for languages this
    /// deployment does not send to Transcribe.
    pub fn locale_for(language: Language) -> Result<&'static str, SpeechError> {
        match language {
            Language::English | Language::Hindi => Ok(language.locale()),
            Language::Odia => Err(SpeechError::UnsupportedLanguage(
                language.locale().to_string(),
            )),
        }
    }

    fn job_name() -> String {
        format!("voice-asr-{}", Uuid::new_v4().simple())
    }

    async fn await_transcript(&self, job_name: &str) -> Result<String, SpeechError> {
        let deadline = Instant::now() + self.job_timeout;

        loop {
            let output = self
                .client
                .get_transcription_job()
                .transcription_job_name(job_name)
                .send()
                .await
                .map_err(|e| classify_sdk_error("transcribe", &e))?;

            let job = output.transcription_job().ok_or_else(|| {
                SpeechError::InvalidResponse("job status without job".to_string())
            })?;

            match job.transcription_job_status() {
                Some(TranscriptionJobStatus::Completed) => {
                    let uri = job
                        .transcript()
                        .and_then(|t| t.transcript_file_uri())
                        .ok_or_else(|| {
                            SpeechError::InvalidResponse("completed job has no transcript".into())
                        })?;
                    return self.fetch_transcript(uri).await;
                },
                Some(TranscriptionJobStatus::Failed) => {
                    return Err(SpeechError::TranscriptionFailed(
                        job.failure_reason().unwrap_or("unknown").to_string(),
                    ));
                },
                _ => {},
            }

            if Instant::now() >= deadline {
                #[allow(clippy::cast_possible_truncation)]
                return Err(SpeechError::Timeout(self.job_timeout.as_millis() as u64));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn fetch_transcript(&self, uri: &str) -> Result<String, SpeechError> {
        let response = self.http.get(uri).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SpeechError::from_status(status, "transcript download failed"));
        }

        let document: TranscriptDocument = response.json().await.map_err(|e| {
            SpeechError::InvalidResponse(format!("Failed to parse transcript: {e}"))
        })?;
        Ok(document.into_text())
    }

    async fn delete_job(&self, job_name: &str) {
        if let Err(e) = self
            .client
            .delete_transcription_job()
            .transcription_job_name(job_name)
            .send()
            .await
        {
            warn!(job_name, error = %e, "Failed to delete transcription job");
        }
    }
}

#[async_trait]
impl StoredAudioTranscriber for TranscribeSpeechProvider {
    #[instrument(skip_all, fields(media_uri = %media_uri, language = %language))]
    async fn transcribe_stored(
        &self,
        media_uri: &str,
        format: AudioFormat,
        language: Language,
    ) -> Result<Transcription, SpeechError> {
        let locale = Self::locale_for(language)?;
        let job_name = Self::job_name();

        self.client
            .start_transcription_job()
            .transcription_job_name(&job_name)
            .language_code(LanguageCode::from(locale))
            .media_format(MediaFormat::from(format.media_format()))
            .media(Media::builder().media_file_uri(media_uri).build())
            .send()
            .await
            .map_err(|e| classify_sdk_error("transcribe", &e))?;
        debug!(job_name, "Started transcription job");

        let outcome = self.await_transcript(&job_name).await;
        self.delete_job(&job_name).await;

        outcome.map(|text| Transcription::new(text).with_language(locale))
    }
}
