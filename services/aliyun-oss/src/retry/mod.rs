//! Retry policies.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use ossreq_core::Error;

mod backoff;
pub use backoff::{BackoffDelayer, EqualJitterBackoff, FixedDelayBackoff, FullJitterBackoff};
mod retryable;
pub use retryable::{
    ClientErrorRetryable, ErrorRetryable, HttpStatusCodeRetryable, ServiceErrorCodeRetryable,
};
pub(crate) use retryable::RETRYABLE_ERROR_MESSAGES;

use crate::constants::{DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF};

/// Retryer decides whether and when a failed attempt is retried.
pub trait Retryer: Debug + Send + Sync + 'static {
    /// Whether `err` is worth another attempt.
    fn is_error_retryable(&self, err: &Error) -> bool;

    /// Maximum attempts per call, including the first one.
    fn max_attempts(&self) -> usize;

    /// Delay after `attempt` (1-based) failed with `err`.
    fn retry_delay(&self, attempt: usize, err: &Error) -> Duration;
}

/// StandardRetryer retries classified errors with a backoff.
///
/// Defaults to 3 attempts with full jitter between 200ms and 20s.
#[derive(Debug, Clone)]
pub struct StandardRetryer {
    max_attempts: usize,
    backoff: Arc<dyn BackoffDelayer>,
    retryables: Vec<Arc<dyn ErrorRetryable>>,
}

impl Default for StandardRetryer {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Arc::new(FullJitterBackoff::new(DEFAULT_BASE_DELAY, DEFAULT_MAX_BACKOFF)),
            retryables: vec![
                Arc::new(HttpStatusCodeRetryable),
                Arc::new(ServiceErrorCodeRetryable),
                Arc::new(ClientErrorRetryable),
            ],
        }
    }
}

impl StandardRetryer {
    /// Create a retryer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum attempts, at least 1.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the backoff strategy.
    pub fn with_backoff(mut self, backoff: impl BackoffDelayer) -> Self {
        self.backoff = Arc::new(backoff);
        self
    }

    /// Add an error classifier.
    pub fn push_retryable(mut self, retryable: impl ErrorRetryable) -> Self {
        self.retryables.push(Arc::new(retryable));
        self
    }
}

impl Retryer for StandardRetryer {
    fn is_error_retryable(&self, err: &Error) -> bool {
        self.retryables.iter().any(|r| r.is_error_retryable(err))
    }

    fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    fn retry_delay(&self, attempt: usize, err: &Error) -> Duration {
        self.backoff.backoff_delay(attempt, err)
    }
}

/// NopRetryer never retries.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopRetryer;

impl Retryer for NopRetryer {
    fn is_error_retryable(&self, _: &Error) -> bool {
        false
    }

    fn max_attempts(&self) -> usize {
        1
    }

    fn retry_delay(&self, _: usize, _: &Error) -> Duration {
        Duration::ZERO
    }
}
