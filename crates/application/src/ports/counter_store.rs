//! Counter store port - atomic conditional increment with per-key expiry

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::RateWindow;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// One admission attempt against a counter key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementRequest {
    /// Store key, `"{session_id}#{request_type}"`
    pub key: String,
    /// Admissions allowed per window
    pub max: u32,
    /// Window length, anchored at the first admission
    pub window: Duration,
    /// Extra record lifetime after the window ends
    pub grace: Duration,
    /// Caller's notion of the current instant
    pub now: DateTime<Utc>,
}

/// Result of a conditional increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementOutcome {
    /// Counter incremented (or a fresh window opened); holds the new state
    Accepted(RateWindow),
    /// Window full; holds the unchanged state
    Refused(RateWindow),
}

impl IncrementOutcome {
    #[must_use]
    pub const fn window(&self) -> &RateWindow {
        match self {
            Self::Accepted(w) | Self::Refused(w) => w,
        }
    }

    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// Key-value store holding rate windows
///
/// Implementations must perform `conditional_increment` as a single atomic
/// operation per key: open-or-reset an expired window, otherwise increment
/// only while `count < max`. Reading first and writing afterwards is not an
/// acceptable implementation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CounterStorePort: Send + Sync {
    /// Atomically admit one request against `request.key`
    ///
    /// # Errors
    /// Returns `ApplicationError::CounterStore` if the store is unavailable.
    async fn conditional_increment(
        &self,
        request: IncrementRequest,
    ) -> Result<IncrementOutcome, ApplicationError>;

    /// Read the current window without consuming quota
    ///
    /// Returns `None` when no record exists or the store already evicted it.
    async fn read(&self, key: &str) -> Result<Option<RateWindow>, ApplicationError>;
}
