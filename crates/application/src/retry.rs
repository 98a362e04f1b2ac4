//! Bounded retry for backend calls
//!
//! Backend calls get a small, fixed number of retries for errors that
//! classify themselves as retryable. Provider calls use a single retry.
//!
//! # Example
//!
//! ```rust,ignore
//! use application::retry::{RetryPolicy, with_retry};
//!
//! let policy = RetryPolicy::once(Duration::from_millis(200));
//! let outcome = with_retry(&policy, || async { backend.call().await }).await;
//! ```

use std::{future::Future, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// How many times to retry and how long to wait in between
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Fixed delay before each retry in milliseconds
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::once(Duration::from_millis(200))
    }
}

impl RetryPolicy {
    /// Exactly one retry after `backoff`
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn once(backoff: Duration) -> Self {
        Self {
            max_retries: 1,
            backoff_ms: backoff.as_millis() as u64,
        }
    }

    /// Never retry
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_ms: 0,
        }
    }

    #[must_use]
    pub const fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Errors that know whether another attempt could succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Final outcome of a retried operation
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    /// Attempts made, including the first
    pub attempts: u32,
}

impl<T, E> RetryOutcome<T, E> {
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Run `operation`, retrying retryable failures per `policy`
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> RetryOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match operation().await {
            Ok(value) => {
                if attempts > 1 {
                    debug!(attempts, "Operation succeeded after retry");
                }
                return RetryOutcome {
                    result: Ok(value),
                    attempts,
                };
            },
            Err(err) if !err.is_retryable() => {
                debug!(attempts, error = %err, "Operation failed with non-retryable error");
                return RetryOutcome {
                    result: Err(err),
                    attempts,
                };
            },
            Err(err) if attempts > policy.max_retries => {
                warn!(attempts, error = %err, "Operation failed after retries");
                return RetryOutcome {
                    result: Err(err),
                    attempts,
                };
            },
            Err(err) => {
                warn!(
                    attempt = attempts,
                    delay_ms = policy.backoff_ms,
                    error = %err,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(policy.backoff()).await;
            },
        }
    }
}
