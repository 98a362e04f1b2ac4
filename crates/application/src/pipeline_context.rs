//! Per-request context threaded through the voice pipeline
//!
//! A `PipelineContext` is created for every incoming pipeline call and carries
//! the request identity, the caller's session and language, the current
//! state-machine position and the partial result built so far. Stages take
//! it by mutable reference; nothing about a request lives in ambient state.
//!
//! # Examples
//!
//! ```
//! use application::PipelineContext;
//! use domain::{Language, ObjectKey, PipelineRequest, PipelineStage, SessionId};
//!
//! let request = PipelineRequest::asr(
//!     SessionId::new("s1").unwrap(),
//!     Language::English,
//!     ObjectKey::upload_ref("uploads/s1/a.wav").unwrap(),
//! );
//! let mut ctx = PipelineContext::new(&request);
//! assert_eq!(ctx.stage(), PipelineStage::Received);
//! ctx.advance(PipelineStage::RateChecked).unwrap();
//! assert!(ctx.advance(PipelineStage::Tts).is_err());
//! ```

use chrono::{DateTime, Utc};
use domain::{
    DomainError, Language, PipelineKind, PipelineRequest, PipelineResult, PipelineStage, SessionId,
};
use uuid::Uuid;

use crate::error::{ApplicationError, PipelineFailure};

/// State of one pipeline invocation
#[derive(Debug, Clone)]
pub struct PipelineContext {
    request_id: Uuid,
    session_id: SessionId,
    language: Language,
    kind: PipelineKind,
    received_at: DateTime<Utc>,
    position: usize,
    result: PipelineResult,
}

impl PipelineContext {
    /// Create a context for `request` with a fresh request id
    #[must_use]
    pub fn new(request: &PipelineRequest) -> Self {
        Self::with_request_id(request, Uuid::now_v7())
    }

    /// Create a context correlated with an upstream request id
    #[must_use]
    pub fn with_request_id(request: &PipelineRequest, request_id: Uuid) -> Self {
        Self {
            request_id,
            session_id: request.session_id.clone(),
            language: request.language,
            kind: request.kind,
            received_at: Utc::now(),
            position: 0,
            result: PipelineResult::new(),
        }
    }

    #[must_use]
    pub const fn request_id(&self) -> Uuid {
        self.request_id
    }

    #[must_use]
    pub const fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub const fn kind(&self) -> PipelineKind {
        self.kind
    }

    #[must_use]
    pub const fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Stage the request is currently in
    #[must_use]
    pub fn stage(&self) -> PipelineStage {
        self.kind
            .sequence()
            .get(self.position)
            .copied()
            .unwrap_or(PipelineStage::Completed)
    }

    /// Partial result accumulated so far
    #[must_use]
    pub const fn result(&self) -> &PipelineResult {
        &self.result
    }

    pub const fn result_mut(&mut self) -> &mut PipelineResult {
        &mut self.result
    }

    /// Move to `next`, which must be the next stage for this pipeline kind
    pub fn advance(&mut self, next: PipelineStage) -> Result<(), DomainError> {
        let expected = self.kind.sequence().get(self.position + 1).copied();
        if expected != Some(next) {
            return Err(DomainError::invalid_transition(
                self.stage().as_str(),
                next.as_str(),
            ));
        }
        self.position += 1;
        self.result.stage_reached = next;
        Ok(())
    }

    /// Abort at the current stage, keeping whatever was produced
    pub fn fail(&mut self, error: impl Into<ApplicationError>) -> PipelineFailure {
        let mut partial = std::mem::take(&mut self.result);
        partial.stage_reached = self.stage();
        PipelineFailure {
            error: error.into(),
            stage_reached: partial.stage_reached,
            partial,
        }
    }

    /// Finish the run and hand out the result
    pub fn complete(mut self) -> Result<PipelineResult, PipelineFailure> {
        if let Err(err) = self.advance(PipelineStage::Completed) {
            return Err(self.fail(ApplicationError::Internal(err.to_string())));
        }
        Ok(self.result)
    }
}
