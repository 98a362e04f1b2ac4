//! Session-scoped admission control
//!
//! Fixed windows anchored at the first request of each `(session, type)`
//! pair. All admission decisions are delegated to a single atomic
//! conditional increment in the counter store. Store failures deny the
//! request.

use std::{fmt, sync::Arc, time::Duration};

use domain::{RateDecision, RequestType, SessionId};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::{
    error::ApplicationError,
    ports::{Clock, CounterStorePort, IncrementOutcome, IncrementRequest},
};

/// Quota applied to every `(session, request_type)` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub max_per_window: u32,
    pub window: Duration,
    pub grace: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_per_window: 5,
            window: Duration::from_secs(3600),
            grace: Duration::from_secs(300),
        }
    }
}

/// Admission status for both request types of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaStatus {
    pub asr: RateDecision,
    pub tts: RateDecision,
    pub max_per_window: u32,
}

/// Rate limiter over a shared counter store
pub struct RateLimiter {
    store: Arc<dyn CounterStorePort>,
    clock: Arc<dyn Clock>,
    policy: RateLimitPolicy,
}

impl fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Counter key for a session and request type
#[must_use]
pub fn counter_key(session: &SessionId, request_type: RequestType) -> String {
    format!("{}#{}", session.as_str(), request_type.as_str())
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn CounterStorePort>,
        clock: Arc<dyn Clock>,
        policy: RateLimitPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Admit or refuse one request under the configured policy
    pub async fn check_and_consume(
        &self,
        session: &SessionId,
        request_type: RequestType,
    ) -> Result<RateDecision, ApplicationError> {
        self.check_and_consume_with(
            session,
            request_type,
            self.policy.max_per_window,
            self.policy.window,
        )
        .await
    }

    /// Admit or refuse one request under an explicit quota
    ///
    /// Refusal is a normal `allowed = false` decision. An unavailable store
    /// yields `ApplicationError::CounterStore`.
    #[instrument(skip_all, fields(session = %session, request_type = %request_type))]
    pub async fn check_and_consume_with(
        &self,
        session: &SessionId,
        request_type: RequestType,
        max_per_window: u32,
        window: Duration,
    ) -> Result<RateDecision, ApplicationError> {
        let now = self.clock.now();

        if max_per_window == 0 {
            return Ok(RateDecision {
                request_type,
                allowed: false,
                remaining: 0,
                reset_in: window,
                current_count: 0,
            });
        }

        let request = IncrementRequest {
            key: counter_key(session, request_type),
            max: max_per_window,
            window,
            grace: self.policy.grace,
            now,
        };

        let outcome = self
            .store
            .conditional_increment(request)
            .await
            .inspect_err(|e| error!(error = %e, "Counter store failed, denying request"))?;

        let decision = match outcome {
            IncrementOutcome::Accepted(w) => {
                RateDecision::accepted(request_type, &w, max_per_window, now, window)
            },
            IncrementOutcome::Refused(w) => RateDecision::refused(request_type, &w, now, window),
        };

        debug!(
            allowed = decision.allowed,
            remaining = decision.remaining,
            reset_in_secs = decision.reset_in_seconds(),
            "Rate limit decision"
        );

        Ok(decision)
    }

    /// Read the current decision for one request type without consuming
    #[instrument(skip_all, fields(session = %session, request_type = %request_type))]
    pub async fn status(
        &self,
        session: &SessionId,
        request_type: RequestType,
    ) -> Result<RateDecision, ApplicationError> {
        let now = self.clock.now();
        let max = self.policy.max_per_window;
        let window = self.policy.window;

        let record = self
            .store
            .read(&counter_key(session, request_type))
            .await
            .inspect_err(|e| error!(error = %e, "Counter store failed on status read"))?;

        Ok(match record {
            Some(w) if !w.is_expired(now, window) => RateDecision {
                request_type,
                allowed: w.has_capacity(max),
                remaining: w.remaining(max),
                reset_in: w.reset_in(now, window),
                current_count: w.count,
            },
            _ => RateDecision::fresh(request_type, max),
        })
    }

    /// Status of both request types
    pub async fn status_all(&self, session: &SessionId) -> Result<QuotaStatus, ApplicationError> {
        Ok(QuotaStatus {
            asr: self.status(session, RequestType::Asr).await?,
            tts: self.status(session, RequestType::Tts).await?,
            max_per_window: self.policy.max_per_window,
        })
    }
}
