//! Voice pipeline orchestrator
//!
//! Drives one request through the state machine
//! `Received → RateChecked → Asr → RetrieveGenerate → RateChecked → Tts →
//! Completed`, skipping the stages its [`PipelineKind`] does not use:
//!
//! 1. ASR-only: consume `asr` quota, transcribe, release the upload
//! 2. TTS-only: consume `tts` quota, synthesize, store or inline the audio
//! 3. Ask: ASR-only, then retrieval, then TTS-only on the answer
//!
//! Quota is consumed per metered stage and never refunded. The uploaded
//! source audio is deleted on every exit from the ASR stage.

use std::{fmt, future::Future, sync::Arc, time::Duration};

use domain::{
    AudioDelivery, ObjectKey, PipelineKind, PipelineRequest, PipelineResult, PipelineStage,
    RateDecision, RequestType,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    object_lifecycle::{ObjectLifecycleManager, UploadHandle},
    provider_router::ProviderRouter,
    rate_limiter::{QuotaStatus, RateLimiter},
};
use crate::{
    error::{ApplicationError, PipelineFailure, ProviderError},
    pipeline_context::PipelineContext,
    ports::RetrievalPort,
    retry::{RetryPolicy, with_retry},
};

/// Bounds for the retrieval call
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub retrieval_timeout: Duration,
    pub retrieval_retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retrieval_timeout: Duration::from_secs(30),
            retrieval_retry: RetryPolicy::once(Duration::from_millis(200)),
        }
    }
}

/// A completed run plus the quota decisions it consumed
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub request_id: Uuid,
    pub result: PipelineResult,
    pub asr_quota: Option<RateDecision>,
    pub tts_quota: Option<RateDecision>,
}

/// Orchestrates rate limiting, provider calls and object cleanup
pub struct VoicePipelineService {
    rate_limiter: Arc<RateLimiter>,
    router: Arc<ProviderRouter>,
    retrieval: Arc<dyn RetrievalPort>,
    objects: Arc<ObjectLifecycleManager>,
    config: PipelineConfig,
}

impl fmt::Debug for VoicePipelineService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoicePipelineService")
            .field("rate_limiter", &self.rate_limiter)
            .field("router", &self.router)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn step(ctx: &mut PipelineContext, next: PipelineStage) -> Result<(), PipelineFailure> {
    ctx.advance(next)
        .map_err(|e| ctx.fail(ApplicationError::Internal(e.to_string())))
}

impl VoicePipelineService {
    pub fn new(
        rate_limiter: Arc<RateLimiter>,
        router: Arc<ProviderRouter>,
        retrieval: Arc<dyn RetrievalPort>,
        objects: Arc<ObjectLifecycleManager>,
    ) -> Self {
        Self::with_config(
            rate_limiter,
            router,
            retrieval,
            objects,
            PipelineConfig::default(),
        )
    }

    pub fn with_config(
        rate_limiter: Arc<RateLimiter>,
        router: Arc<ProviderRouter>,
        retrieval: Arc<dyn RetrievalPort>,
        objects: Arc<ObjectLifecycleManager>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            rate_limiter,
            router,
            retrieval,
            objects,
            config,
        }
    }

    /// Run a pipeline request with a fresh request id
    pub async fn run(&self, request: PipelineRequest) -> Result<PipelineOutcome, PipelineFailure> {
        self.run_with_id(request, Uuid::now_v7()).await
    }

    /// Run a pipeline request correlated with `request_id`
    #[instrument(skip_all, fields(
        request_id = %request_id,
        session = %request.session_id,
        kind = %request.kind,
        language = %request.language
    ))]
    pub async fn run_with_id(
        &self,
        request: PipelineRequest,
        request_id: Uuid,
    ) -> Result<PipelineOutcome, PipelineFailure> {
        let mut ctx = PipelineContext::with_request_id(&request, request_id);
        let mut asr_quota = None;
        let mut tts_quota = None;

        match request.kind {
            PipelineKind::AsrOnly => {
                let audio = source_audio(&request)?;
                asr_quota = Some(self.rate_check(&mut ctx, RequestType::Asr).await?);
                self.asr_stage(&mut ctx, audio).await?;
            },
            PipelineKind::TtsOnly => {
                let text = request.text().ok_or_else(|| {
                    PipelineFailure::at_received(ApplicationError::Validation(
                        "text is required".to_string(),
                    ))
                })?;
                tts_quota = Some(self.rate_check(&mut ctx, RequestType::Tts).await?);
                self.tts_stage(&mut ctx, text, request.inline_audio).await?;
            },
            PipelineKind::Ask => {
                let audio = source_audio(&request)?;
                asr_quota = Some(self.rate_check(&mut ctx, RequestType::Asr).await?);
                let transcript = self.asr_stage(&mut ctx, audio).await?;
                let answer = self.retrieve_stage(&mut ctx, &transcript).await?;
                tts_quota = Some(self.rate_check(&mut ctx, RequestType::Tts).await?);
                self.tts_stage(&mut ctx, &answer, false).await?;
            },
        }

        let result = ctx.complete()?;
        info!(
            asr_provider = ?result.provider_used.asr,
            tts_provider = ?result.provider_used.tts,
            "Pipeline completed"
        );

        Ok(PipelineOutcome {
            request_id,
            result,
            asr_quota,
            tts_quota,
        })
    }

    /// Quota status for both request types, without consuming
    pub async fn quota_status(
        &self,
        session: &domain::SessionId,
    ) -> Result<QuotaStatus, ApplicationError> {
        self.rate_limiter.status_all(session).await
    }

    /// Presigned upload slot for new source audio
    pub async fn issue_upload_handle(
        &self,
        session: &domain::SessionId,
        format: domain::AudioFormat,
    ) -> Result<UploadHandle, ApplicationError> {
        self.objects.issue_upload_handle(session, format).await
    }

    async fn rate_check(
        &self,
        ctx: &mut PipelineContext,
        request_type: RequestType,
    ) -> Result<RateDecision, PipelineFailure> {
        step(ctx, PipelineStage::RateChecked)?;
        let session = ctx.session_id().clone();

        let decision = self
            .rate_limiter
            .check_and_consume(&session, request_type)
            .await
            .map_err(|e| ctx.fail(e))?;

        if !decision.allowed {
            let retry_after_secs = decision.reset_in_seconds().max(1);
            info!(%request_type, retry_after_secs, "Rate limit exceeded");
            return Err(ctx.fail(ApplicationError::RateLimited {
                request_type,
                retry_after_secs,
            }));
        }

        Ok(decision)
    }

    async fn asr_stage(
        &self,
        ctx: &mut PipelineContext,
        audio: &ObjectKey,
    ) -> Result<String, PipelineFailure> {
        step(ctx, PipelineStage::Asr)?;
        let language = ctx.language();

        let transcribed = self
            .consuming_source(audio, self.router.transcribe(audio, language))
            .await;

        match transcribed {
            Ok(output) => {
                let result = ctx.result_mut();
                result.transcript = Some(output.text.clone());
                result.provider_used.asr = Some(output.provider);
                Ok(output.text)
            },
            Err(e) => {
                warn!(error = %e, "Transcription failed");
                Err(ctx.fail(e))
            },
        }
    }

    /// Await `stage`, then release `audio` regardless of its outcome
    async fn consuming_source<T>(&self, audio: &ObjectKey, stage: impl Future<Output = T>) -> T {
        let output = stage.await;
        self.objects.release(audio).await;
        output
    }

    async fn retrieve_stage(
        &self,
        ctx: &mut PipelineContext,
        question: &str,
    ) -> Result<String, PipelineFailure> {
        step(ctx, PipelineStage::RetrieveGenerate)?;
        let name = self.retrieval.name();
        let timeout = self.config.retrieval_timeout;

        let answered = with_retry(&self.config.retrieval_retry, || async {
            tokio::time::timeout(timeout, self.retrieval.retrieve_and_generate(question))
                .await
                .unwrap_or_else(|_| {
                    Err(ProviderError::transient(
                        name,
                        format!("timed out after {}s", timeout.as_secs()),
                    ))
                })
        })
        .await
        .into_result();

        match answered {
            Ok(answer) if answer.text.trim().is_empty() => {
                Err(ctx.fail(ProviderError::permanent(name, "empty answer")))
            },
            Ok(answer) => {
                ctx.result_mut().answer = Some(answer.text.clone());
                Ok(answer.text)
            },
            Err(e) => {
                warn!(error = %e, "Retrieval failed");
                Err(ctx.fail(e))
            },
        }
    }

    async fn tts_stage(
        &self,
        ctx: &mut PipelineContext,
        text: &str,
        inline: bool,
    ) -> Result<(), PipelineFailure> {
        step(ctx, PipelineStage::Tts)?;
        let session = ctx.session_id().clone();

        let output = self
            .router
            .synthesize(text, ctx.language())
            .await
            .map_err(|e| {
                warn!(error = %e, "Synthesis failed");
                ctx.fail(e)
            })?;
        ctx.result_mut().provider_used.tts = Some(output.provider);

        let delivery = if inline {
            AudioDelivery::Inline {
                bytes: output.audio,
                format: output.format,
            }
        } else {
            let key = self
                .objects
                .store_response(&session, output.audio, output.format)
                .await
                .map_err(|e| ctx.fail(e))?;
            let handle = self
                .objects
                .issue_download_handle(&key)
                .await
                .map_err(|e| ctx.fail(e))?;
            AudioDelivery::DownloadUrl {
                object_key: key,
                url: handle.url,
                expires_in_secs: handle.expires_in,
            }
        };

        ctx.result_mut().audio = Some(delivery);
        Ok(())
    }
}

fn source_audio(request: &PipelineRequest) -> Result<&ObjectKey, PipelineFailure> {
    request.source_audio().ok_or_else(|| {
        PipelineFailure::at_received(ApplicationError::Validation(
            "audio_ref is required".to_string(),
        ))
    })
}
