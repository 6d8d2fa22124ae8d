//! Token-bucket admission control for outbound Reddit calls.
//!
//! Tokens refill continuously at the configured calls-per-window rate and cap
//! at the window size, so a quiet process can burst a full window's worth of
//! calls before pacing kicks in. A refused admission is flow control, not an
//! error: callers sleep for the returned wait and try again.
//!
//! The limiter also listens to Reddit's `x-ratelimit-*` response headers.
//! When the service reports an exhausted quota, its reset horizon overrides
//! the bucket's own estimate; the service's authority wins on disagreement.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::RateLimitConfig;
use crate::domain::coerce;

/// Hold applied when the service reports quota exhaustion without a usable
/// reset value.
const DEFAULT_HOLD: Duration = Duration::from_secs(60);

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Admission {
    pub allowed: bool,
    pub wait: Duration,
}

impl Admission {
    const fn allowed() -> Self {
        Self {
            allowed: true,
            wait: Duration::ZERO,
        }
    }

    const fn refused(wait: Duration) -> Self {
        Self {
            allowed: false,
            wait,
        }
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
    /// Service-imposed hold from quota-exhaustion feedback.
    hold_until: Option<Instant>,
}

/// Process-wide token-bucket rate limiter.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<BucketState>,
    burst: f64,
    refill_per_sec: f64,
    enabled: bool,
}

impl RateLimiter {
    /// A limiter admitting `calls_per_window` calls per `window`, with burst
    /// capacity equal to one full window's quota.
    pub fn new(calls_per_window: u32, window: Duration) -> Self {
        let burst = f64::from(calls_per_window.max(1));
        let window_secs = window.as_secs_f64().max(0.001);
        Self {
            state: Mutex::new(BucketState {
                tokens: burst,
                last_refill: Instant::now(),
                hold_until: None,
            }),
            burst,
            refill_per_sec: burst / window_secs,
            enabled: true,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        let mut limiter = Self::new(config.calls_per_window, config.window);
        limiter.enabled = config.enabled;
        limiter
    }

    /// A limiter that admits everything with zero wait.
    pub fn disabled() -> Self {
        let mut limiter = Self::new(1, Duration::from_secs(1));
        limiter.enabled = false;
        limiter
    }

    /// Refill for elapsed time, then either consume one token or report how
    /// long until one becomes available.
    pub fn check_and_reserve(&self) -> Admission {
        if !self.enabled {
            return Admission::allowed();
        }

        let mut state = self.state.lock().expect("rate limiter lock is not poisoned");
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.burst);
        state.last_refill = now;

        if let Some(hold) = state.hold_until {
            if now < hold {
                // Service authority wins: wait at least until its reset.
                return Admission::refused(self.refill_wait(state.tokens).max(hold - now));
            }
            state.hold_until = None;
        }

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            Admission::allowed()
        } else {
            Admission::refused(self.refill_wait(state.tokens))
        }
    }

    /// Suspend the current task until an admission succeeds. Only this task
    /// waits; the limiter's lock is never held across the sleep.
    pub async fn acquire(&self) {
        loop {
            let admission = self.check_and_reserve();
            if admission.allowed {
                return;
            }
            tracing::debug!(
                wait_secs = admission.wait.as_secs_f64(),
                "admission refused, pacing outbound call"
            );
            tokio::time::sleep(admission.wait).await;
        }
    }

    /// Fold the service's rate-limit headers back into admission state.
    /// Header values arrive as decimal-formatted strings (`"88.0"`), so they
    /// go through the same tolerant parsing as payload fields.
    pub fn on_response_headers(&self, headers: &BTreeMap<String, String>) {
        if !self.enabled {
            return;
        }

        let remaining = headers
            .get("x-ratelimit-remaining")
            .and_then(|value| coerce::numeric_str(value));
        let Some(remaining) = remaining else {
            return;
        };
        if remaining > 0.0 {
            return;
        }

        let hold = headers
            .get("x-ratelimit-reset")
            .and_then(|value| coerce::numeric_str(value))
            .filter(|secs| *secs > 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or(DEFAULT_HOLD);

        let mut state = self.state.lock().expect("rate limiter lock is not poisoned");
        let hold_until = Instant::now() + hold;
        state.hold_until = Some(
            state
                .hold_until
                .map_or(hold_until, |existing| existing.max(hold_until)),
        );
        tracing::warn!(
            hold_secs = hold.as_secs_f64(),
            "service reported exhausted quota, holding admissions"
        );
    }

    fn refill_wait(&self, tokens: f64) -> Duration {
        Duration::from_secs_f64(((1.0 - tokens) / self.refill_per_sec).max(0.0))
    }
}
