use std::sync::Arc;

use async_trait::async_trait;
use http::{Method, StatusCode};
use log::debug;
use ossreq_core::crc64;
use ossreq_core::{Error, RequestMessage, ResponseMessage, Result};

use super::Handler;
use crate::constants::X_OSS_HASH_CRC64ECMA;
use crate::error_body::service_error;
use crate::ExecuteContext;

/// ResponseCheckMiddleware turns failed responses into errors and verifies
/// body checksums.
pub struct ResponseCheckMiddleware {
    next: Arc<dyn Handler>,
    check_upload_crc: bool,
    check_download_crc: bool,
}

impl ResponseCheckMiddleware {
    /// Wrap `next`.
    pub fn new(next: Arc<dyn Handler>, check_upload_crc: bool, check_download_crc: bool) -> Self {
        Self {
            next,
            check_upload_crc,
            check_download_crc,
        }
    }
}

#[async_trait]
impl Handler for ResponseCheckMiddleware {
    async fn handle(&self, req: RequestMessage, ctx: &mut ExecuteContext) -> Result<ResponseMessage> {
        let target = format!("{} {}", req.method, req.uri);
        let is_upload = matches!(req.method, Method::PUT | Method::POST);
        let is_download = req.method == Method::GET;

        let upload_crc = if self.check_upload_crc && is_upload {
            req.body.crc64().await?
        } else {
            None
        };

        let resp = self.next.handle(req, ctx).await?;

        if !resp.is_success() {
            return Err(Error::service(service_error(&resp, target)));
        }

        let server_crc = resp
            .header(X_OSS_HASH_CRC64ECMA)
            .and_then(|v| v.parse::<u64>().ok());
        if let Some(server) = server_crc {
            let client = if is_upload {
                upload_crc
            } else if is_download && self.check_download_crc && resp.status == StatusCode::OK {
                Some(crc64::checksum(&resp.body))
            } else {
                None
            };
            if let Some(client) = client {
                if client != server {
                    return Err(Error::checksum_mismatch(client, server));
                }
                debug!("crc64 of {target} matches: {client}");
            }
        }

        for handler in &ctx.response_handlers {
            handler(&resp)?;
        }

        Ok(resp)
    }
}
