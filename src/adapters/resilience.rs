//! Per-adapter resilience primitives: timeout and token-bucket rate
//! limiting (§5 Concurrency & Resource Model).
//!
//! Grounded on `iterations/v3/resilience/src/circuit_breaker.rs` in the reference pipeline,
//! which tracks state with plain atomics behind an `Arc` rather than a
//! mutex-guarded struct — the same approach fits a token bucket, which is
//! just a counter plus a last-refill timestamp.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

/// Default per-adapter-call timeout (§4.F "Timeout").
pub const ADAPTER_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_BURST: u64 = 5;
const DEFAULT_REFILL_PER_SEC: u64 = 1;

/// Independent token-bucket per adapter (§5 "Rate limiting"). Exhaustion
/// causes the adapter to return empty rather than block the orchestrator.
pub struct RateLimiter {
    tokens: AtomicU64,
    last_refill_millis: AtomicI64,
    burst: u64,
    refill_per_sec: u64,
}

impl RateLimiter {
    pub fn new(burst: u64, refill_per_sec: u64) -> Self {
        Self {
            tokens: AtomicU64::new(burst),
            last_refill_millis: AtomicI64::new(i64::MIN),
            burst,
            refill_per_sec,
        }
    }

    /// Attempts to take a token. `now_millis` is an explicit parameter
    /// (Design Notes: never wall-clock inside the pure core) so the
    /// limiter's refill behaviour is reproducible in tests.
    pub fn try_acquire(&self, now_millis: i64) -> bool {
        let last = self.last_refill_millis.swap(now_millis, Ordering::SeqCst);
        if last != i64::MIN && now_millis > last {
            let elapsed_secs = ((now_millis - last) as u64) / 1000;
            if elapsed_secs > 0 {
                let refill = elapsed_secs * self.refill_per_sec;
                let current = self.tokens.load(Ordering::SeqCst);
                let new_value = (current + refill).min(self.burst);
                self.tokens.store(new_value, Ordering::SeqCst);
            }
        }

        let current = self.tokens.load(Ordering::SeqCst);
        if current == 0 {
            return false;
        }
        self.tokens.store(current - 1, Ordering::SeqCst);
        true
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_BURST, DEFAULT_REFILL_PER_SEC)
    }
}
