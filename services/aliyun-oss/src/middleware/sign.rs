use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use ossreq_core::{Context, Error, ErrorKind, ProvideCredential, RequestMessage, ResponseMessage, Result};

use super::Handler;
use crate::sign::SignRequest;
use crate::{Credential, ExecuteContext};

/// SignMiddleware loads a credential and signs every attempt.
///
/// Requests are sent unsigned when the provider has no credential.
pub struct SignMiddleware {
    next: Arc<dyn Handler>,
    ctx: Context,
    signer: Arc<dyn SignRequest>,
    provider: Arc<dyn ProvideCredential<Credential = Credential>>,
}

impl SignMiddleware {
    /// Wrap `next`, signing with `signer` and credentials from `provider`.
    pub fn new(
        next: Arc<dyn Handler>,
        ctx: Context,
        signer: Arc<dyn SignRequest>,
        provider: Arc<dyn ProvideCredential<Credential = Credential>>,
    ) -> Self {
        Self {
            next,
            ctx,
            signer,
            provider,
        }
    }
}

#[async_trait]
impl Handler for SignMiddleware {
    async fn handle(&self, mut req: RequestMessage, ctx: &mut ExecuteContext) -> Result<ResponseMessage> {
        let credential = tokio::select! {
            _ = ctx.cancel.cancelled() => {
                return Err(Error::canceled("operation is canceled while loading credential"));
            }
            res = self.provider.provide_credential(&self.ctx) => res.map_err(|e| match e.kind() {
                ErrorKind::CredentialFetch | ErrorKind::Canceled => e,
                _ => Error::credential_fetch("load credential failed").with_source(e),
            })?,
        };

        match credential {
            Some(cred) => {
                ctx.signing.credential = Some(cred);
                self.signer.sign_request(&mut req, &mut ctx.signing).await?;
            }
            None => debug!("no credential provided, sending request anonymously"),
        }

        self.next.handle(req, ctx).await
    }
}
