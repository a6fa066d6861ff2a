use crate::Credential;
use async_trait::async_trait;
use ossreq_core::{Context, ProvideCredential, Result};

/// AnonymousCredentialProvider never provides a credential.
///
/// Requests executed with it are sent unsigned, and presigning returns the
/// plain url.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnonymousCredentialProvider;

impl AnonymousCredentialProvider {
    /// Create a new AnonymousCredentialProvider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProvideCredential for AnonymousCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
        Ok(None)
    }
}
