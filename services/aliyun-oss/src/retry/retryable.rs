use std::fmt::Debug;

use http::StatusCode;
use ossreq_core::{Error, ErrorKind};

/// ErrorRetryable classifies errors worth another attempt.
pub trait ErrorRetryable: Debug + Send + Sync + 'static {
    /// Whether `err` is retryable.
    fn is_error_retryable(&self, err: &Error) -> bool;
}

/// Retries on 401, 408, 429 and any 5xx response.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpStatusCodeRetryable;

impl ErrorRetryable for HttpStatusCodeRetryable {
    fn is_error_retryable(&self, err: &Error) -> bool {
        let Some(se) = err.service_error() else {
            return false;
        };

        matches!(
            se.status,
            StatusCode::UNAUTHORIZED | StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS
        ) || se.status.is_server_error()
    }
}

/// Retries on service error codes known to be transient.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceErrorCodeRetryable;

const RETRYABLE_ERROR_CODES: &[&str] = &["RequestTimeTooSkewed", "BadRequest"];

/// Codes only retryable together with a specific message.
pub(crate) const RETRYABLE_ERROR_MESSAGES: &[(&str, &str)] = &[(
    "InvalidArgument",
    "Invalid signing date in Authorization header.",
)];

impl ErrorRetryable for ServiceErrorCodeRetryable {
    fn is_error_retryable(&self, err: &Error) -> bool {
        err.service_error().is_some_and(|se| {
            RETRYABLE_ERROR_CODES.contains(&se.code.as_str())
                || RETRYABLE_ERROR_MESSAGES
                    .iter()
                    .any(|(code, message)| se.code == *code && se.message == *message)
        })
    }
}

/// Retries on client side failures that may succeed on another attempt.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClientErrorRetryable;

impl ErrorRetryable for ClientErrorRetryable {
    fn is_error_retryable(&self, err: &Error) -> bool {
        matches!(
            err.kind(),
            ErrorKind::CredentialFetch
                | ErrorKind::ChecksumMismatch
                | ErrorKind::Serialization
                | ErrorKind::SignatureCall
                | ErrorKind::Transport
        )
    }
}
