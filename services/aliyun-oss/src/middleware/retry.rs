use std::sync::Arc;

use async_trait::async_trait;
use chrono::TimeDelta;
use http::header::DATE;
use log::{debug, info};
use ossreq_core::time::{now, parse_http_date, parse_rfc3339};
use ossreq_core::{Error, ErrorKind, RequestMessage, ResponseMessage, Result};

use super::Handler;
use crate::retry::Retryer;
use crate::retry::RETRYABLE_ERROR_MESSAGES;
use crate::ExecuteContext;

/// RetryMiddleware runs attempts of the inner handler until one succeeds or
/// the retryer gives up.
pub struct RetryMiddleware {
    next: Arc<dyn Handler>,
    retryer: Arc<dyn Retryer>,
    correct_clock_skew: bool,
}

impl RetryMiddleware {
    /// Wrap `next` with `retryer`.
    pub fn new(next: Arc<dyn Handler>, retryer: Arc<dyn Retryer>, correct_clock_skew: bool) -> Self {
        Self {
            next,
            retryer,
            correct_clock_skew,
        }
    }
}

#[async_trait]
impl Handler for RetryMiddleware {
    async fn handle(&self, req: RequestMessage, ctx: &mut ExecuteContext) -> Result<ResponseMessage> {
        let max_attempts = ctx
            .retry_max_attempts
            .unwrap_or_else(|| self.retryer.max_attempts())
            .max(1);

        let mut attempt = 0;
        loop {
            if ctx.cancel.is_cancelled() {
                return Err(Error::canceled("operation is canceled"));
            }
            attempt += 1;

            let err = match self.next.handle(req.clone(), ctx).await {
                Ok(resp) => return Ok(resp),
                Err(err) => err,
            };

            if attempt >= max_attempts {
                debug!("giving up after {attempt} attempts: {err}");
                return Err(err);
            }
            if !req.body.is_seekable() {
                debug!("request body can't be replayed, not retrying: {err}");
                return Err(err);
            }
            if err.kind() == ErrorKind::Canceled || !self.retryer.is_error_retryable(&err) {
                debug!("error is not retryable: {err}");
                return Err(err);
            }

            // Measured before sleeping, the server time ages with us.
            let skew = if self.correct_clock_skew {
                clock_skew_offset(&err)
            } else {
                None
            };

            let delay = self.retryer.retry_delay(attempt, &err);
            info!("attempt {attempt} failed, retrying in {delay:?}: {err}");
            tokio::select! {
                _ = ctx.cancel.cancelled() => {
                    return Err(Error::canceled("operation is canceled"));
                }
                _ = tokio::time::sleep(delay) => {}
            }

            if let Some(offset) = skew {
                info!("correcting clock skew by {}s", offset.num_seconds());
                ctx.signing.clock_offset = Some(offset);
            }
        }
    }
}

/// Offset between the server clock and ours if `err` reports a skewed clock.
pub(crate) fn clock_skew_offset(err: &Error) -> Option<TimeDelta> {
    let se = err.service_error()?;
    let skewed = se.code == "RequestTimeTooSkewed"
        || RETRYABLE_ERROR_MESSAGES
            .iter()
            .any(|(code, message)| se.code == *code && se.message == *message);
    if !skewed {
        return None;
    }

    let server_time = se
        .field("ServerTime")
        .and_then(|v| parse_rfc3339(v).ok())
        .or_else(|| {
            se.headers
                .get(DATE)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| parse_http_date(v).ok())
        })?;
    Some(server_time - now())
}
