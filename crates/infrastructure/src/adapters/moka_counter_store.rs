//! Moka counter store - in-process rate windows
//!
//! Each key is updated through moka's per-key compute, which serializes
//! concurrent writers on the same key. Records expire individually at the
//! window end plus grace. Windows are never evicted by size; once
//! `max_keys` windows are live, new keys are refused with a store error.

use std::time::{Duration, Instant};

use application::{
    error::ApplicationError,
    ports::{CounterStorePort, IncrementOutcome, IncrementRequest},
};
use async_trait::async_trait;
use domain::RateWindow;
use moka::{Expiry, future::Cache, ops::compute::Op};
use tracing::{debug, instrument};

/// Stored window plus the lifetime it was written with
#[derive(Debug, Clone, Copy)]
struct Slot {
    window: RateWindow,
    ttl: Duration,
}

struct SlotExpiry;

impl Expiry<String, Slot> for SlotExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Slot,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Slot,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory counter store for single-instance deployments
pub struct MokaCounterStore {
    cache: Cache<String, Slot>,
    max_keys: u64,
}

impl std::fmt::Debug for MokaCounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCounterStore")
            .field("entries", &self.cache.entry_count())
            .field("max_keys", &self.max_keys)
            .finish()
    }
}

impl MokaCounterStore {
    /// Create a store tracking at most `max_keys` live windows
    #[must_use]
    pub fn new(max_keys: u64) -> Self {
        let cache = Cache::builder().expire_after(SlotExpiry).build();
        Self { cache, max_keys }
    }

    fn is_full(&self) -> bool {
        self.cache.entry_count() >= self.max_keys
    }
}

impl Default for MokaCounterStore {
    fn default() -> Self {
        Self::new(100_000)
    }
}

fn ttl_until(window: &RateWindow, now: chrono::DateTime<chrono::Utc>) -> Duration {
    (window.expires_at - now).to_std().unwrap_or(Duration::ZERO)
}

/// Admission rule, evaluated while moka holds the key
fn next_state(current: Option<RateWindow>, request: &IncrementRequest) -> IncrementOutcome {
    match current {
        Some(w) if !w.is_expired(request.now, request.window) => {
            if w.has_capacity(request.max) {
                IncrementOutcome::Accepted(RateWindow {
                    count: w.count + 1,
                    ..w
                })
            } else {
                IncrementOutcome::Refused(w)
            }
        },
        _ => IncrementOutcome::Accepted(RateWindow::open(
            request.now,
            request.window,
            request.grace,
        )),
    }
}

#[async_trait]
impl CounterStorePort for MokaCounterStore {
    #[instrument(skip_all, fields(key = %request.key), level = "debug")]
    async fn conditional_increment(
        &self,
        request: IncrementRequest,
    ) -> Result<IncrementOutcome, ApplicationError> {
        let mut outcome = None;

        self.cache
            .entry(request.key.clone())
            .and_compute_with(|entry| {
                let current = entry.map(|e| e.into_value().window);
                if current.is_none() && self.is_full() {
                    outcome = Some(Err(ApplicationError::CounterStore(format!(
                        "rate window capacity of {} keys reached",
                        self.max_keys
                    ))));
                    return std::future::ready(Op::Nop);
                }
                let next = next_state(current, &request);
                let op = match next {
                    IncrementOutcome::Accepted(window) => Op::Put(Slot {
                        window,
                        ttl: ttl_until(&window, request.now),
                    }),
                    IncrementOutcome::Refused(_) => Op::Nop,
                };
                outcome = Some(Ok(next));
                std::future::ready(op)
            })
            .await;

        let outcome = outcome.ok_or_else(|| {
            ApplicationError::CounterStore("compute closure did not run".to_string())
        })??;
        debug!(
            accepted = outcome.is_accepted(),
            count = outcome.window().count,
            "Counter updated"
        );
        Ok(outcome)
    }

    async fn read(&self, key: &str) -> Result<Option<RateWindow>, ApplicationError> {
        Ok(self.cache.get(key).await.map(|slot| slot.window))
    }
}
