use std::fmt::{self, Debug};
use std::future::Future;

use crate::Credential;
use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use ossreq_core::{Context, ProvideCredential, Result};

type CredentialFn = Box<dyn Fn() -> BoxFuture<'static, Result<Credential>> + Send + Sync>;

/// ClosureCredentialProvider calls an async closure for every credential.
///
/// Useful to plug in sources this crate doesn't know about, like a vault
/// client. Wrap it in a
/// [`RefreshingCredentialProvider`](crate::RefreshingCredentialProvider)
/// when the closure is expensive.
///
/// ```
/// use ossreq_aliyun_oss::{ClosureCredentialProvider, Credential};
///
/// let provider = ClosureCredentialProvider::new(|| async {
///     Ok(Credential::new("access_key_id", "access_key_secret"))
/// });
/// ```
pub struct ClosureCredentialProvider {
    f: CredentialFn,
}

impl ClosureCredentialProvider {
    /// Create a provider from an async closure.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Credential>> + Send + 'static,
    {
        Self {
            f: Box::new(move || f().boxed()),
        }
    }
}

impl Debug for ClosureCredentialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosureCredentialProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl ProvideCredential for ClosureCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
        (self.f)().await.map(Some)
    }
}
