use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};

use crate::{Body, Result};

/// RequestMessage is the request flowing through a handler chain.
#[derive(Debug, Clone, Default)]
pub struct RequestMessage {
    /// HTTP method.
    pub method: Method,
    /// Absolute request uri.
    pub uri: Uri,
    /// HTTP headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Body,
}

impl RequestMessage {
    /// Create a request without headers and body.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Body::Empty,
        }
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a header, replacing any previous value.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        self.headers
            .insert(HeaderName::try_from(name)?, HeaderValue::try_from(value)?);
        Ok(self)
    }

    /// Header value as str, `None` if missing or not visible ascii.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Convert into an [`http::Request`] ready to be sent.
    pub fn into_http(self) -> Result<http::Request<Body>> {
        let mut req = http::Request::builder()
            .method(self.method)
            .uri(self.uri)
            .body(self.body)?;
        *req.headers_mut() = self.headers;
        Ok(req)
    }
}

/// ResponseMessage is a fully received response.
#[derive(Debug, Clone, Default)]
pub struct ResponseMessage {
    /// HTTP status.
    pub status: StatusCode,
    /// HTTP headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl ResponseMessage {
    /// Header value as str, `None` if missing or not visible ascii.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl From<http::Response<Bytes>> for ResponseMessage {
    fn from(resp: http::Response<Bytes>) -> Self {
        let (parts, body) = resp.into_parts();
        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }
}
