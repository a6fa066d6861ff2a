use ossreq_core::time::{now, DateTime};
use ossreq_core::utils::Redact;
use ossreq_core::SigningCredential;
use std::fmt::{Debug, Formatter};

/// Credential that holds the access_key and secret_key.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Access key id for oss.
    pub access_key_id: String,
    /// Access key secret for oss.
    pub access_key_secret: String,
    /// Security token for temporary (STS) credentials.
    pub security_token: Option<String>,
    /// Expiration time for this credential.
    pub expiration: Option<DateTime>,
}

impl Credential {
    /// Create a long-term credential.
    pub fn new(access_key_id: &str, access_key_secret: &str) -> Self {
        Self {
            access_key_id: access_key_id.to_string(),
            access_key_secret: access_key_secret.to_string(),
            ..Default::default()
        }
    }

    /// Set the security token.
    pub fn with_security_token(mut self, token: &str) -> Self {
        self.security_token = Some(token.to_string());
        self
    }

    /// Set the expiration.
    pub fn with_expiration(mut self, expiration: DateTime) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// A credential is empty when either its id or secret is empty.
    ///
    /// Empty credentials can't sign anything.
    pub fn is_empty(&self) -> bool {
        self.access_key_id.is_empty() || self.access_key_secret.is_empty()
    }

    /// Whether the expiration has passed.
    pub fn is_expired(&self) -> bool {
        self.expiration.is_some_and(|v| v <= now())
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("access_key_secret", &Redact::from(&self.access_key_secret))
            .field("security_token", &Redact::from(&self.security_token))
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl SigningCredential for Credential {
    fn is_valid(&self) -> bool {
        !self.is_empty() && !self.is_expired()
    }

    fn expires_at(&self) -> Option<DateTime> {
        self.expiration
    }
}
