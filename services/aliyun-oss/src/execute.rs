//! Inputs and outputs of [`Client::execute`](crate::Client::execute) and
//! [`Client::presign`](crate::Client::presign).

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::TimeDelta;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use ossreq_core::time::{now, DateTime};
use ossreq_core::{Body, ResponseMessage, Result};
use tokio_util::sync::CancellationToken;

use crate::sign::SigningContext;

/// Callback run against every successful response.
pub type ResponseHandler = Arc<dyn Fn(&ResponseMessage) -> Result<()> + Send + Sync>;

/// Callback receiving `(transferred, total)` bytes.
pub type ProgressFn = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// A logical operation to run against OSS.
#[derive(Debug, Clone, Default)]
pub struct OperationInput {
    /// HTTP method.
    pub method: Method,
    /// Target bucket, `None` for service level operations.
    pub bucket: Option<String>,
    /// Target object key.
    pub key: Option<String>,
    /// Request headers.
    pub headers: HeaderMap,
    /// Query parameters, not encoded. Empty values are sent as bare keys.
    pub parameters: Vec<(String, String)>,
    /// Request body.
    pub body: Body,
}

impl OperationInput {
    /// Create an input with `method`.
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Set the bucket.
    pub fn with_bucket(mut self, bucket: &str) -> Self {
        self.bucket = Some(bucket.to_string());
        self
    }

    /// Set the object key.
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    /// Set a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        self.headers
            .insert(HeaderName::try_from(name)?, HeaderValue::try_from(value)?);
        Ok(self)
    }

    /// Add a query parameter.
    pub fn with_parameter(mut self, key: &str, value: &str) -> Self {
        self.parameters.push((key.to_string(), value.to_string()));
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }
}

/// Result of a successful operation.
#[derive(Debug, Clone)]
pub struct OperationOutput {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl From<ResponseMessage> for OperationOutput {
    fn from(resp: ResponseMessage) -> Self {
        Self {
            status: resp.status,
            headers: resp.headers,
            body: resp.body,
        }
    }
}

/// Per call overrides of [`Client::execute`](crate::Client::execute).
#[derive(Clone, Default)]
pub struct ExecuteOptions {
    /// Overrides the retryer's maximum attempts.
    pub retry_max_attempts: Option<usize>,
    /// Overrides the transport timeout.
    pub timeout: Option<Duration>,
    /// Cancels the call cooperatively.
    pub cancel: Option<CancellationToken>,
    /// Run in order against the successful response.
    pub response_handlers: Vec<ResponseHandler>,
    /// Receives body transfer progress.
    pub progress: Option<ProgressFn>,
}

impl ExecuteOptions {
    /// Set the maximum attempts of this call.
    pub fn with_retry_max_attempts(mut self, attempts: usize) -> Self {
        self.retry_max_attempts = Some(attempts);
        self
    }

    /// Set the transport timeout of this call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Cancel this call when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Add a response handler.
    pub fn push_response_handler(
        mut self,
        handler: impl Fn(&ResponseMessage) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.response_handlers.push(Arc::new(handler));
        self
    }

    /// Set the progress callback.
    pub fn with_progress(mut self, f: impl Fn(u64, Option<u64>) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(f));
        self
    }
}

impl Debug for ExecuteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecuteOptions")
            .field("retry_max_attempts", &self.retry_max_attempts)
            .field("timeout", &self.timeout)
            .field("cancel", &self.cancel)
            .field("response_handlers", &self.response_handlers.len())
            .finish_non_exhaustive()
    }
}

/// State of one [`Client::execute`](crate::Client::execute) call, shared by all attempts.
pub struct ExecuteContext {
    /// Signing inputs and outputs of the current attempt.
    pub signing: SigningContext,
    /// Overrides the retryer's maximum attempts.
    pub retry_max_attempts: Option<usize>,
    /// Overrides the transport timeout.
    pub timeout: Option<Duration>,
    /// Cancels the call cooperatively.
    pub cancel: CancellationToken,
    /// Run in order against the successful response.
    pub response_handlers: Vec<ResponseHandler>,
    /// Receives body transfer progress.
    pub progress: Option<ProgressFn>,
}

impl ExecuteContext {
    /// Create a context from `signing` and the per call `options`.
    pub fn new(signing: SigningContext, options: ExecuteOptions) -> Self {
        Self {
            signing,
            retry_max_attempts: options.retry_max_attempts,
            timeout: options.timeout,
            cancel: options.cancel.unwrap_or_default(),
            response_handlers: options.response_handlers,
            progress: options.progress,
        }
    }

    pub(crate) fn report_progress(&self, transferred: u64, total: Option<u64>) {
        if let Some(f) = &self.progress {
            f(transferred, total);
        }
    }
}

impl Debug for ExecuteContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecuteContext")
            .field("signing", &self.signing)
            .field("retry_max_attempts", &self.retry_max_attempts)
            .field("timeout", &self.timeout)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

/// Options of [`Client::presign`](crate::Client::presign).
#[derive(Debug, Clone, Default)]
pub struct PresignOptions {
    /// When the url expires, 15 minutes after signing by default.
    pub expiration: Option<DateTime>,
}

impl PresignOptions {
    /// Expire at `expiration`.
    pub fn with_expiration(mut self, expiration: DateTime) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Expire `expires` from now.
    pub fn with_expires_in(mut self, expires: Duration) -> Self {
        self.expiration = TimeDelta::from_std(expires)
            .ok()
            .and_then(|d| now().checked_add_signed(d));
        self
    }
}

/// A presigned request.
#[derive(Debug, Clone)]
pub struct PresignResult {
    /// HTTP method the url must be used with.
    pub method: Method,
    /// The presigned url.
    pub url: String,
    /// When the url expires, `None` for unsigned urls.
    pub expiration: Option<DateTime>,
    /// Headers the caller must send along with the url.
    pub signed_headers: HashMap<String, String>,
}
