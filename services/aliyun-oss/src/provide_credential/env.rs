use crate::{constants::*, Credential};
use async_trait::async_trait;
use ossreq_core::{Context, ProvideCredential, Result};

/// EnvCredentialProvider loads credentials from environment variables.
///
/// This provider looks for the following environment variables:
/// - `OSS_ACCESS_KEY_ID`: The access key ID
/// - `OSS_ACCESS_KEY_SECRET`: The access key secret
/// - `OSS_SESSION_TOKEN`: The security token (optional)
#[derive(Debug, Default)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    /// Create a new EnvCredentialProvider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let envs = ctx.env_vars();

        let access_key_id = envs.get(OSS_ACCESS_KEY_ID).filter(|v| !v.is_empty());
        let access_key_secret = envs.get(OSS_ACCESS_KEY_SECRET).filter(|v| !v.is_empty());

        match (access_key_id, access_key_secret) {
            (Some(ak), Some(sk)) => Ok(Some(Credential {
                access_key_id: ak.clone(),
                access_key_secret: sk.clone(),
                security_token: envs.get(OSS_SESSION_TOKEN).filter(|v| !v.is_empty()).cloned(),
                expiration: None,
            })),
            _ => Ok(None),
        }
    }
}
