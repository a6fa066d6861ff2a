use std::time::Duration;

use crate::Credential;
use async_trait::async_trait;
use ossreq_core::{Context, CredentialCache, ProvideCredential, Result};

/// RefreshingCredentialProvider caches the credentials of another provider.
///
/// Expiring credentials are refreshed in the background once they get within
/// the refresh threshold (5 minutes by default). Concurrent callers share one
/// upstream call.
#[derive(Debug, Clone)]
pub struct RefreshingCredentialProvider<P>
where
    P: ProvideCredential<Credential = Credential>,
{
    cache: CredentialCache<P>,
}

impl<P> RefreshingCredentialProvider<P>
where
    P: ProvideCredential<Credential = Credential>,
{
    /// Wrap `provider` with the default refresh threshold.
    pub fn new(provider: P) -> Self {
        Self {
            cache: CredentialCache::new(provider),
        }
    }

    /// Wrap `provider`, refreshing credentials that expire within `threshold`.
    pub fn with_threshold(provider: P, threshold: Duration) -> Self {
        Self {
            cache: CredentialCache::with_threshold(provider, threshold),
        }
    }
}

#[async_trait]
impl<P> ProvideCredential for RefreshingCredentialProvider<P>
where
    P: ProvideCredential<Credential = Credential>,
{
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        self.cache.get(ctx).await
    }
}
