use std::collections::HashMap;
use std::fmt;

use http::HeaderMap;
use http::StatusCode;
use thiserror::Error;

/// The error type for ossreq operations
#[derive(Error, Debug)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<anyhow::Error>,
    detail: Option<Box<ErrorDetail>>,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Credentials exist but are invalid, for example an empty access key.
    CredentialInvalid,

    /// Credentials could not be fetched from their source.
    CredentialFetch,

    /// Request cannot be sent (missing required fields, invalid names, etc.)
    RequestInvalid,

    /// Configuration error (missing fields, invalid values)
    ConfigInvalid,

    /// The CRC64 computed locally differs from the one reported by the server.
    ChecksumMismatch,

    /// Encoding or decoding a payload failed.
    Serialization,

    /// The remote signature delegate failed.
    SignatureCall,

    /// The remote signature delegate returned an unusable result.
    SignatureResult,

    /// The requested presign expiration exceeds what the protocol allows.
    ExpirationTooLong,

    /// The server answered with a non-2xx status.
    Service,

    /// Sending the request or receiving the response failed.
    Transport,

    /// The operation was cancelled by the caller.
    Canceled,

    /// Unexpected errors
    Unexpected,
}

/// Structured payload attached to some error kinds.
#[derive(Debug, Clone)]
pub enum ErrorDetail {
    /// Details of a non-2xx server response.
    Service(ServiceError),
    /// Both sides of a CRC64 inconsistency.
    Checksum {
        /// CRC64 computed by the client.
        client: u64,
        /// CRC64 reported by the server.
        server: u64,
    },
}

/// ServiceError carries everything the server told us about a failed request.
#[derive(Debug, Clone, Default)]
pub struct ServiceError {
    /// HTTP status code.
    pub status: StatusCode,
    /// Error code, like `NoSuchKey`.
    pub code: String,
    /// Human readable message.
    pub message: String,
    /// Request id assigned by the server.
    pub request_id: String,
    /// Detailed error code (`EC`).
    pub ec: String,
    /// All decoded fields of the error document.
    pub fields: HashMap<String, String>,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw response body.
    pub snapshot: bytes::Bytes,
    /// `METHOD url` of the failed request.
    pub request_target: String,
}

impl ServiceError {
    /// Get a decoded error field by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.as_str())
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "service error: status {}, code {}, message {:?}, request id {}",
            self.status.as_u16(),
            self.code,
            self.message,
            self.request_id
        )?;
        if !self.ec.is_empty() {
            write!(f, ", ec {}", self.ec)?;
        }
        if !self.request_target.is_empty() {
            write!(f, ", target {}", self.request_target)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            detail: None,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach structured detail.
    pub fn with_detail(mut self, detail: ErrorDetail) -> Self {
        self.detail = Some(Box::new(detail));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured detail if any.
    pub fn detail(&self) -> Option<&ErrorDetail> {
        self.detail.as_deref()
    }

    /// Get the server error if this error is built from a server response.
    pub fn service_error(&self) -> Option<&ServiceError> {
        match self.detail() {
            Some(ErrorDetail::Service(se)) => Some(se),
            _ => None,
        }
    }

    /// Get `(client, server)` CRC64 values of a checksum mismatch.
    pub fn checksum_values(&self) -> Option<(u64, u64)> {
        match self.detail() {
            Some(ErrorDetail::Checksum { client, server }) => Some((*client, *server)),
            _ => None,
        }
    }

    /// Check if this is a credential error
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::CredentialInvalid | ErrorKind::CredentialFetch
        )
    }
}

// Convenience constructors
impl Error {
    /// Create a credential invalid error
    pub fn credential_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialInvalid, message)
    }

    /// Create a credential fetch error
    pub fn credential_fetch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialFetch, message)
    }

    /// Create a request invalid error
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Create a config invalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create a checksum mismatch error carrying both values.
    pub fn checksum_mismatch(client: u64, server: u64) -> Self {
        Self::new(
            ErrorKind::ChecksumMismatch,
            format!("crc64 is inconsistent, client: {client}, server: {server}"),
        )
        .with_detail(ErrorDetail::Checksum { client, server })
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    /// Create a signature call error
    pub fn signature_call(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SignatureCall, message)
    }

    /// Create a signature result error
    pub fn signature_result(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SignatureResult, message)
    }

    /// Create an expiration too long error
    pub fn expiration_too_long(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExpirationTooLong, message)
    }

    /// Create a service error from the server response.
    pub fn service(err: ServiceError) -> Self {
        Self::new(ErrorKind::Service, err.to_string()).with_detail(ErrorDetail::Service(err))
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create a canceled error
    pub fn canceled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Canceled, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

/// Cloning keeps kind, message and detail; the source chain is flattened into text.
impl Clone for Error {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: self.source.as_ref().map(|e| anyhow::anyhow!("{e:#}")),
            detail: self.detail.clone(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::CredentialInvalid => write!(f, "invalid credentials"),
            ErrorKind::CredentialFetch => write!(f, "fetch credentials failed"),
            ErrorKind::RequestInvalid => write!(f, "invalid request"),
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::ChecksumMismatch => write!(f, "checksum mismatch"),
            ErrorKind::Serialization => write!(f, "serialization failed"),
            ErrorKind::SignatureCall => write!(f, "signature delegate call failed"),
            ErrorKind::SignatureResult => write!(f, "signature delegate result invalid"),
            ErrorKind::ExpirationTooLong => write!(f, "expiration too long"),
            ErrorKind::Service => write!(f, "service error"),
            ErrorKind::Transport => write!(f, "transport error"),
            ErrorKind::Canceled => write!(f, "canceled"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::ToStrError> for Error {
    fn from(err: http::header::ToStrError) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUriParts> for Error {
    fn from(err: http::uri::InvalidUriParts) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::serialization(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}
