use std::fmt::Debug;
use std::time::Duration;

use ossreq_core::Error;
use rand::Rng;

/// BackoffDelayer decides how long to wait before the next attempt.
pub trait BackoffDelayer: Debug + Send + Sync + 'static {
    /// Delay after `attempt` (1-based) failed with `err`.
    fn backoff_delay(&self, attempt: usize, err: &Error) -> Duration;
}

/// Waits the same delay between all attempts.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelayBackoff {
    delay: Duration,
}

impl FixedDelayBackoff {
    /// Create a fixed backoff.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl BackoffDelayer for FixedDelayBackoff {
    fn backoff_delay(&self, _: usize, _: &Error) -> Duration {
        self.delay
    }
}

/// `random(0, 1) * min(2^attempt * base, cap)`
#[derive(Debug, Clone, Copy)]
pub struct FullJitterBackoff {
    base_delay: Duration,
    max_backoff: Duration,
}

impl FullJitterBackoff {
    /// Create a full jitter backoff.
    pub fn new(base_delay: Duration, max_backoff: Duration) -> Self {
        Self {
            base_delay,
            max_backoff,
        }
    }
}

impl BackoffDelayer for FullJitterBackoff {
    fn backoff_delay(&self, attempt: usize, _: &Error) -> Duration {
        let ceil = exponential_ceil(attempt, self.base_delay, self.max_backoff);
        ceil.mul_f64(rand::thread_rng().gen::<f64>())
    }
}

/// `ceil / 2 + random(0, 1) * (ceil / 2 + 1ns)` with `ceil = min(2^attempt * base, cap)`
#[derive(Debug, Clone, Copy)]
pub struct EqualJitterBackoff {
    base_delay: Duration,
    max_backoff: Duration,
}

impl EqualJitterBackoff {
    /// Create an equal jitter backoff.
    pub fn new(base_delay: Duration, max_backoff: Duration) -> Self {
        Self {
            base_delay,
            max_backoff,
        }
    }
}

impl BackoffDelayer for EqualJitterBackoff {
    fn backoff_delay(&self, attempt: usize, _: &Error) -> Duration {
        let half = exponential_ceil(attempt, self.base_delay, self.max_backoff) / 2;
        let jitter = (half + Duration::from_nanos(1)).mul_f64(rand::thread_rng().gen::<f64>());
        half + jitter
    }
}

fn exponential_ceil(attempt: usize, base: Duration, cap: Duration) -> Duration {
    let factor = 2u32.saturating_pow(u32::try_from(attempt).unwrap_or(u32::MAX));
    base.saturating_mul(factor).min(cap)
}
