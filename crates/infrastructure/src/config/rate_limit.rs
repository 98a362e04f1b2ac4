//! Per-session quota configuration.

use std::time::Duration;

use application::RateLimitPolicy;
use serde::{Deserialize, Serialize};

/// Where rate windows are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterBackend {
    /// In-process moka cache; single instance only
    #[default]
    Memory,
    /// SQLite file shared by every process on the host
    Sqlite,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests admitted per `(session, type)` per window
    #[serde(default = "default_max_requests")]
    pub max_requests_per_window: u32,

    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Extra retention after the window closes before a record may be purged
    #[serde(default = "default_grace_secs")]
    pub grace_secs: u64,

    #[serde(default)]
    pub backend: CounterBackend,

    /// Database file for the `sqlite` backend
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,

    /// Live windows the `memory` backend tracks before refusing new sessions
    #[serde(default = "default_max_tracked_keys")]
    pub max_tracked_keys: u64,
}

const fn default_max_requests() -> u32 {
    5
}

const fn default_window_secs() -> u64 {
    3600
}

const fn default_grace_secs() -> u64 {
    300
}

fn default_sqlite_path() -> String {
    "voice_gateway_rate_limits.db".to_string()
}

const fn default_max_tracked_keys() -> u64 {
    100_000
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests_per_window: default_max_requests(),
            window_secs: default_window_secs(),
            grace_secs: default_grace_secs(),
            backend: CounterBackend::default(),
            sqlite_path: default_sqlite_path(),
            max_tracked_keys: default_max_tracked_keys(),
        }
    }
}

impl RateLimitConfig {
    /// Policy handed to the rate limiter
    #[must_use]
    pub const fn policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            max_per_window: self.max_requests_per_window,
            window: Duration::from_secs(self.window_secs),
            grace: Duration::from_secs(self.grace_secs),
        }
    }

    pub(super) fn validate(&self, errors: &mut Vec<String>) {
        if self.max_requests_per_window == 0 {
            errors.push("rate_limit.max_requests_per_window must be greater than 0".to_string());
        }
        if self.window_secs == 0 {
            errors.push("rate_limit.window_secs must be greater than 0".to_string());
        }
        if self.backend == CounterBackend::Sqlite && self.sqlite_path.trim().is_empty() {
            errors.push("rate_limit.sqlite_path is required for the sqlite backend".to_string());
        }
    }
}
