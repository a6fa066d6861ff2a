//! [`HttpSend`] implementation backed by [`reqwest`].
//!
//! ```no_run
//! use ossreq_core::Context;
//! use ossreq_http_send_reqwest::ReqwestHttpSend;
//!
//! let ctx = Context::new().with_http_send(ReqwestHttpSend::default());
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::BodyExt;
use ossreq_core::{Body, Error, HttpSend, Result};
use reqwest::{Client, Request};
use tokio_util::io::ReaderStream;

/// ReqwestHttpSend sends requests with a [`reqwest::Client`].
#[derive(Debug, Default)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

async fn into_reqwest_body(body: Body) -> Result<reqwest::Body> {
    match body {
        Body::Empty => Ok(reqwest::Body::from(Bytes::new())),
        Body::Bytes(bs) => Ok(reqwest::Body::from(bs)),
        Body::File(path) => {
            let f = tokio::fs::File::open(&path).await.map_err(|e| {
                Error::request_invalid(format!("open {} failed", path.display())).with_source(e)
            })?;
            Ok(reqwest::Body::wrap_stream(ReaderStream::new(f)))
        }
        Body::Stream(s) => {
            let stream = s
                .take()
                .ok_or_else(|| Error::request_invalid("stream body has already been consumed"))?;
            Ok(reqwest::Body::wrap_stream(stream))
        }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Body>) -> Result<http::Response<Bytes>> {
        let (parts, body) = req.into_parts();
        let body = into_reqwest_body(body).await?;
        let req = Request::try_from(http::Request::from_parts(parts, body))
            .map_err(|e| Error::request_invalid("convert request failed").with_source(e))?;

        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(|e| Error::transport("send request failed").with_source(e))?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| Error::transport("read response body failed").with_source(e))?;
        Ok(http::Response::from_parts(parts, bs))
    }
}
