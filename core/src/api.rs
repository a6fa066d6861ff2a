use std::fmt::Debug;
use std::sync::Arc;

use crate::time::DateTime;
use crate::{Context, Result};

/// SigningCredential is the trait used by signers as the signing key.
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Check if the credential is usable for signing.
    fn is_valid(&self) -> bool;

    /// When this credential stops being usable.
    ///
    /// `None` means it never expires.
    fn expires_at(&self) -> Option<DateTime> {
        None
    }
}

impl<T: SigningCredential> SigningCredential for Option<T> {
    fn is_valid(&self) -> bool {
        let Some(ctx) = self else {
            return false;
        };

        ctx.is_valid()
    }

    fn expires_at(&self) -> Option<DateTime> {
        self.as_ref().and_then(|v| v.expires_at())
    }
}

/// ProvideCredential is the trait used to load credentials from a source.
///
/// Returning `Ok(None)` means this source has nothing to offer, which lets
/// chains fall through to the next source.
#[async_trait::async_trait]
pub trait ProvideCredential: Debug + Send + Sync + Unpin + 'static {
    /// Credential returned by this provider.
    type Credential: Send + Sync + Unpin + 'static;

    /// Load credential from current env.
    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>>;
}

#[async_trait::async_trait]
impl<P: ProvideCredential + ?Sized> ProvideCredential for Arc<P> {
    type Credential = P::Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        self.as_ref().provide_credential(ctx).await
    }
}
