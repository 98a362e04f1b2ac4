//! Voice pipeline handlers

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use domain::{
    AsrProvider, AudioDelivery, AudioFormat, Language, ObjectKey, PipelineRequest, RateDecision,
    TtsProvider,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use validator::Validate;

use application::{ApplicationError, PipelineFailure, PipelineOutcome, UploadHandle};

use crate::{
    error::ApiError,
    middleware::{RequestId, ValidatedJson, VoiceHeaders},
    state::AppState,
};

/// Body of `/voice/asr` and `/voice/ask`
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AudioRequest {
    #[validate(length(min = 1, max = 1024, message = "must be between 1 and 1024 characters"))]
    pub audio_ref: String,
}

/// Body of `/voice/tts`
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct TtsRequest {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub text: String,

    /// Store the audio and return a download URL; `false` returns base64
    #[serde(default = "default_return_url")]
    pub return_url: bool,
}

const fn default_return_url() -> bool {
    true
}

/// Query of `/voice/upload-url`
#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub file_type: Option<String>,
}

/// Quota left after an admitted request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitInfo {
    pub remaining: u32,
    pub reset_in_seconds: u64,
}

impl From<&RateDecision> for RateLimitInfo {
    fn from(decision: &RateDecision) -> Self {
        Self {
            remaining: decision.remaining,
            reset_in_seconds: decision.reset_in_seconds(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AsrResponse {
    pub text: String,
    pub provider: AsrProvider,
    pub language: Language,
    pub rate_limit: RateLimitInfo,
}

#[derive(Debug, Serialize)]
pub struct TtsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
    pub provider: TtsProvider,
    pub language: Language,
    pub rate_limit: RateLimitInfo,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub transcribed_text: String,
    pub rag_response: String,
    pub audio_url: Option<String>,
    pub asr_provider: AsrProvider,
    pub tts_provider: TtsProvider,
    pub language: Language,
}

/// Quota snapshot for one request type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaInfo {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_in_seconds: u64,
    pub current_count: u32,
}

impl From<&RateDecision> for QuotaInfo {
    fn from(decision: &RateDecision) -> Self {
        Self {
            allowed: decision.allowed,
            remaining: decision.remaining,
            reset_in_seconds: decision.reset_in_seconds(),
            current_count: decision.current_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RateLimitStatusResponse {
    pub session_id: String,
    pub max_requests_per_window: u32,
    pub asr: QuotaInfo,
    pub tts: QuotaInfo,
}

fn missing(what: &str) -> ApiError {
    ApiError::from(ApplicationError::Internal(format!(
        "completed pipeline is missing {what}"
    )))
}

fn audio_ref(raw: &str) -> Result<ObjectKey, ApiError> {
    Ok(ObjectKey::upload_ref(raw)?)
}

/// Run the pipeline on its own task
///
/// A client that disconnects drops this handler, not the run, so quota
/// accounting and source-audio cleanup always finish.
async fn run_detached(
    state: &AppState,
    request: PipelineRequest,
    request_id: RequestId,
) -> Result<PipelineOutcome, ApiError> {
    let pipeline = state.pipeline.clone();
    let handle =
        tokio::spawn(async move { pipeline.run_with_id(request, request_id.as_uuid()).await });

    match handle.await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => {
            error!(error = %e, "Pipeline task failed");
            Err(PipelineFailure::at_received(ApplicationError::Internal(e.to_string())).into())
        },
    }
}

/// Transcribe previously uploaded audio
#[instrument(skip_all, fields(session = %voice.session, language = %voice.language))]
pub async fn asr(
    State(state): State<AppState>,
    request_id: RequestId,
    voice: VoiceHeaders,
    ValidatedJson(body): ValidatedJson<AudioRequest>,
) -> Result<Json<AsrResponse>, ApiError> {
    let key = audio_ref(&body.audio_ref)?;
    let request = PipelineRequest::asr(voice.session, voice.language, key);

    let outcome = run_detached(&state, request, request_id).await?;
    let quota = outcome.asr_quota.as_ref().ok_or_else(|| missing("asr quota"))?;

    Ok(Json(AsrResponse {
        provider: outcome
            .result
            .provider_used
            .asr
            .ok_or_else(|| missing("asr provider"))?,
        rate_limit: quota.into(),
        text: outcome.result.transcript.unwrap_or_default(),
        language: voice.language,
    }))
}

/// Synthesize speech from text
#[instrument(skip_all, fields(session = %voice.session, language = %voice.language))]
pub async fn tts(
    State(state): State<AppState>,
    request_id: RequestId,
    voice: VoiceHeaders,
    ValidatedJson(body): ValidatedJson<TtsRequest>,
) -> Result<Json<TtsResponse>, ApiError> {
    let request = PipelineRequest::tts(voice.session, voice.language, body.text)?
        .with_inline_audio(!body.return_url);

    let outcome = run_detached(&state, request, request_id).await?;
    let quota = outcome.tts_quota.as_ref().ok_or_else(|| missing("tts quota"))?;
    let provider = outcome
        .result
        .provider_used
        .tts
        .ok_or_else(|| missing("tts provider"))?;

    let (audio_url, audio_base64) = match outcome.result.audio {
        Some(AudioDelivery::DownloadUrl { url, .. }) => (Some(url), None),
        Some(AudioDelivery::Inline { bytes, .. }) => (None, Some(STANDARD.encode(bytes))),
        None => return Err(missing("audio")),
    };

    Ok(Json(TtsResponse {
        audio_url,
        audio_base64,
        provider,
        language: voice.language,
        rate_limit: quota.into(),
    }))
}

/// Full pipeline: transcribe, answer, synthesize
#[instrument(skip_all, fields(session = %voice.session, language = %voice.language))]
pub async fn ask(
    State(state): State<AppState>,
    request_id: RequestId,
    voice: VoiceHeaders,
    ValidatedJson(body): ValidatedJson<AudioRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let key = audio_ref(&body.audio_ref)?;
    let request = PipelineRequest::ask(voice.session, voice.language, key);

    let outcome = run_detached(&state, request, request_id).await?;
    let result = outcome.result;
    let providers = result.provider_used;

    let audio_url = match result.audio {
        Some(AudioDelivery::DownloadUrl { url, .. }) => Some(url),
        _ => None,
    };

    Ok(Json(AskResponse {
        transcribed_text: result.transcript.ok_or_else(|| missing("transcript"))?,
        rag_response: result.answer.ok_or_else(|| missing("answer"))?,
        audio_url,
        asr_provider: providers.asr.ok_or_else(|| missing("asr provider"))?,
        tts_provider: providers.tts.ok_or_else(|| missing("tts provider"))?,
        language: voice.language,
    }))
}

/// Quota left for both request types, without consuming any
#[instrument(skip_all, fields(session = %voice.session))]
pub async fn rate_limit_status(
    State(state): State<AppState>,
    voice: VoiceHeaders,
) -> Result<Json<RateLimitStatusResponse>, ApiError> {
    let status = state.pipeline.quota_status(&voice.session).await?;

    Ok(Json(RateLimitStatusResponse {
        session_id: voice.session.as_str().to_string(),
        max_requests_per_window: status.max_per_window,
        asr: (&status.asr).into(),
        tts: (&status.tts).into(),
    }))
}

/// Presigned upload slot for new source audio
#[instrument(skip_all, fields(session = %voice.session))]
pub async fn upload_url(
    State(state): State<AppState>,
    voice: VoiceHeaders,
    query: Result<Query<UploadQuery>, QueryRejection>,
) -> Result<Json<UploadHandle>, ApiError> {
    let Query(query) = query?;
    let format = match query.file_type.as_deref().map(str::trim) {
        None | Some("") => AudioFormat::Wav,
        Some(file_type) => file_type.parse::<AudioFormat>()?,
    };

    let handle = state
        .pipeline
        .issue_upload_handle(&voice.session, format)
        .await?;
    info!(key = %handle.object_key, "Upload URL issued");
    Ok(Json(handle))
}
