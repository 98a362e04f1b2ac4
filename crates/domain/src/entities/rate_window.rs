//! Session-anchored rate windows

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::RequestType;

fn add_saturating(at: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(duration)
        .ok()
        .and_then(|delta| at.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Counter state for one `(session, request_type)` pair
///
/// A window starts at the first request and lasts a fixed duration. The
/// record expires from the store `grace` after the window ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateWindow {
    /// When the current window began
    pub window_start: DateTime<Utc>,
    /// Requests consumed in this window
    pub count: u32,
    /// Absolute time after which the store may evict the record
    pub expires_at: DateTime<Utc>,
}

impl RateWindow {
    /// Open a fresh window holding the first request
    #[must_use]
    pub fn open(now: DateTime<Utc>, window: Duration, grace: Duration) -> Self {
        Self {
            window_start: now,
            count: 1,
            expires_at: add_saturating(add_saturating(now, window), grace),
        }
    }

    /// A window is expired once `now - window_start >= window`
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now >= self.window_end(window)
    }

    /// Instant at which the window resets
    #[must_use]
    pub fn window_end(&self, window: Duration) -> DateTime<Utc> {
        add_saturating(self.window_start, window)
    }

    /// Time until the window resets, saturating at zero
    #[must_use]
    pub fn reset_in(&self, now: DateTime<Utc>, window: Duration) -> Duration {
        (self.window_end(window) - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Quota left under `max`
    #[must_use]
    pub const fn remaining(&self, max: u32) -> u32 {
        max.saturating_sub(self.count)
    }

    /// Whether one more request fits under `max`
    #[must_use]
    pub const fn has_capacity(&self, max: u32) -> bool {
        self.count < max
    }
}

/// Outcome of an admission check or a status read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateDecision {
    pub request_type: RequestType,
    pub allowed: bool,
    pub remaining: u32,
    pub reset_in: Duration,
    pub current_count: u32,
}

impl RateDecision {
    /// Decision describing a window that has not been opened yet
    #[must_use]
    pub const fn fresh(request_type: RequestType, max: u32) -> Self {
        Self {
            request_type,
            allowed: max > 0,
            remaining: max,
            reset_in: Duration::ZERO,
            current_count: 0,
        }
    }

    /// Decision for an admitted request
    #[must_use]
    pub fn accepted(
        request_type: RequestType,
        window: &RateWindow,
        max: u32,
        now: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            request_type,
            allowed: true,
            remaining: window.remaining(max),
            reset_in: window.reset_in(now, duration),
            current_count: window.count,
        }
    }

    /// Decision for a refused request
    #[must_use]
    pub fn refused(
        request_type: RequestType,
        window: &RateWindow,
        now: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Self {
            request_type,
            allowed: false,
            remaining: 0,
            reset_in: window.reset_in(now, duration),
            current_count: window.count,
        }
    }

    /// Reset time in whole seconds, rounded up
    #[must_use]
    pub const fn reset_in_seconds(&self) -> u64 {
        let secs = self.reset_in.as_secs();
        if self.reset_in.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);
    const GRACE: Duration = Duration::from_secs(300);

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn open_sets_ttl_with_grace() {
        let window = RateWindow::open(t0(), HOUR, GRACE);
        assert_eq!(window.count, 1);
        assert_eq!(window.window_start, t0());
        assert_eq!(window.expires_at, t0() + TimeDelta::seconds(3900));
    }

    #[test]
    fn expiry_is_inclusive_at_window_end() {
        let window = RateWindow::open(t0(), HOUR, GRACE);
        assert!(!window.is_expired(t0() + TimeDelta::seconds(3599), HOUR));
        assert!(window.is_expired(t0() + TimeDelta::seconds(3600), HOUR));
    }

    #[test]
    fn reset_in_counts_down() {
        let window = RateWindow::open(t0(), HOUR, GRACE);
        let reset = window.reset_in(t0() + TimeDelta::seconds(600), HOUR);
        assert_eq!(reset, Duration::from_secs(3000));
    }

    #[test]
    fn reset_in_saturates_after_window() {
        let window = RateWindow::open(t0(), HOUR, GRACE);
        let reset = window.reset_in(t0() + TimeDelta::seconds(4000), HOUR);
        assert_eq!(reset, Duration::ZERO);
    }

    #[test]
    fn remaining_saturates() {
        let window = RateWindow {
            count: 7,
            ..RateWindow::open(t0(), HOUR, GRACE)
        };
        assert_eq!(window.remaining(5), 0);
        assert!(!window.has_capacity(5));
    }

    #[test]
    fn refused_reports_zero_remaining() {
        let window = RateWindow {
            count: 5,
            ..RateWindow::open(t0(), HOUR, GRACE)
        };
        let decision =
            RateDecision::refused(RequestType::Asr, &window, t0() + TimeDelta::seconds(10), HOUR);
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert_eq!(decision.reset_in_seconds(), 3590);
    }

    #[test]
    fn reset_seconds_round_up() {
        let decision = RateDecision {
            request_type: RequestType::Tts,
            allowed: false,
            remaining: 0,
            reset_in: Duration::from_millis(1500),
            current_count: 5,
        };
        assert_eq!(decision.reset_in_seconds(), 2);
    }

    #[test]
    fn fresh_decision_has_full_quota() {
        let decision = RateDecision::fresh(RequestType::Asr, 5);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 5);
        assert_eq!(decision.reset_in_seconds(), 0);
        assert_eq!(decision.current_count, 0);
    }
}
