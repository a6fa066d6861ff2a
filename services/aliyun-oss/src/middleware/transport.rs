use std::time::Duration;

use async_trait::async_trait;
use http::header::CONTENT_LENGTH;
use http::HeaderValue;
use log::debug;
use ossreq_core::{Context, Error, RequestMessage, ResponseMessage, Result};

use super::Handler;
use crate::ExecuteContext;

/// TransportHandler sends requests with the [`HttpSend`](ossreq_core::HttpSend) of a [`Context`].
pub struct TransportHandler {
    ctx: Context,
    timeout: Duration,
}

impl TransportHandler {
    /// Send with `ctx`, timing out calls after `timeout` unless overridden per call.
    pub fn new(ctx: Context, timeout: Duration) -> Self {
        Self { ctx, timeout }
    }
}

#[async_trait]
impl Handler for TransportHandler {
    async fn handle(&self, mut req: RequestMessage, ctx: &mut ExecuteContext) -> Result<ResponseMessage> {
        let content_length = req.body.content_length().await?;
        if let Some(len) = content_length {
            if !req.headers.contains_key(CONTENT_LENGTH) {
                req.headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
            }
        }

        let timeout = ctx.timeout.unwrap_or(self.timeout);
        debug!("sending request: {} {}", req.method, req.uri);
        let resp = tokio::time::timeout(timeout, self.ctx.http_send(req.into_http()?))
            .await
            .map_err(|_| Error::transport(format!("request timed out after {timeout:?}")))??;
        let resp = ResponseMessage::from(resp);

        if let Some(len) = content_length.filter(|v| *v > 0) {
            ctx.report_progress(len, Some(len));
        }
        if !resp.body.is_empty() {
            let total = resp.body.len() as u64;
            ctx.report_progress(total, Some(total));
        }

        Ok(resp)
    }
}
