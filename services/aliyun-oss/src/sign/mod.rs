//! Request signers.
//!
//! Every signer reads its inputs from a [`SigningContext`] and writes the
//! computed string to sign, date and scope back into it so presigning can
//! report them.

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::TimeDelta;
use ossreq_core::time::{now, DateTime};
use ossreq_core::{Error, RequestMessage, Result};

use crate::constants::DEFAULT_PRODUCT;
use crate::Credential;

mod v1;
pub use v1::V1Signer;
mod v4;
pub use v4::V4Signer;
pub(crate) use v4::is_default_signed_header;
mod remote;
pub use remote::{RemoteSigner, SignatureDelegate};

/// Where the signature is placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SigningMethod {
    /// `Authorization` header.
    #[default]
    Header,
    /// Query parameters, used by presigned urls.
    Query,
}

/// Mutable scratch state of one signing pass.
///
/// Inputs are filled by the pipeline before signing; the `*_to_sign` fields
/// are outputs written by the signer.
#[derive(Debug, Clone, Default)]
pub struct SigningContext {
    /// Target bucket.
    pub bucket: Option<String>,
    /// Target object key.
    pub key: Option<String>,
    /// Region in the V4 scope.
    pub region: String,
    /// Product in the V4 scope.
    pub product: String,
    /// Extra header names to sign in V4.
    pub additional_headers: Vec<String>,
    /// Extra query keys to treat as sub-resources in V1.
    pub sub_resource: Vec<String>,
    /// Expiration of query signatures.
    pub expiration: Option<DateTime>,
    /// Correction added to the local clock, learnt from a skewed response.
    pub clock_offset: Option<TimeDelta>,
    /// Credential used for signing.
    pub credential: Option<Credential>,
    /// Pinned signing time, the corrected local clock is used if unset.
    pub sign_time: Option<DateTime>,
    /// Header or query signing.
    pub method: SigningMethod,

    /// The string to sign computed by the last pass.
    pub string_to_sign: String,
    /// The signing time used by the last pass.
    pub date_to_sign: Option<DateTime>,
    /// The V4 scope used by the last pass.
    pub scope_to_sign: String,
    /// The additional headers signed by the last pass.
    pub additional_headers_to_sign: Vec<String>,
}

impl SigningContext {
    /// Create a context for `region` with the default product.
    pub fn new(region: &str) -> Self {
        Self {
            region: region.to_string(),
            product: DEFAULT_PRODUCT.to_string(),
            ..Default::default()
        }
    }

    /// Set the bucket.
    pub fn with_bucket(mut self, bucket: &str) -> Self {
        self.bucket = Some(bucket.to_string());
        self
    }

    /// Set the object key.
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    /// Set the credential.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Pin the signing time.
    pub fn with_sign_time(mut self, time: DateTime) -> Self {
        self.sign_time = Some(time);
        self
    }

    /// Sign into query parameters that expire at `expiration`.
    pub fn with_query(mut self, expiration: Option<DateTime>) -> Self {
        self.method = SigningMethod::Query;
        self.expiration = expiration;
        self
    }

    /// Set the additional headers to sign.
    pub fn with_additional_headers(mut self, headers: &[&str]) -> Self {
        self.additional_headers = headers.iter().map(|v| v.to_string()).collect();
        self
    }

    /// The time to sign with.
    pub fn signing_time(&self) -> DateTime {
        self.sign_time
            .unwrap_or_else(|| now() + self.clock_offset.unwrap_or_else(TimeDelta::zero))
    }

    /// The credential to sign with, which must be non-empty.
    pub(crate) fn signing_credential(&self) -> Result<Credential> {
        match &self.credential {
            Some(cred) if !cred.is_empty() => Ok(cred.clone()),
            Some(_) => Err(Error::credential_invalid(
                "credential is empty, access key id and secret are required",
            )),
            None => Err(Error::credential_invalid("no credential to sign with")),
        }
    }

    pub(crate) fn canonical_uri(&self) -> String {
        let mut s = String::from("/");
        if let Some(bucket) = &self.bucket {
            s.push_str(bucket);
            s.push('/');
        }
        if let Some(key) = &self.key {
            s.push_str(key);
        }
        s
    }
}

/// SignRequest signs a request in place.
#[async_trait]
pub trait SignRequest: Debug + Send + Sync + 'static {
    /// Sign `req` with the inputs in `ctx`, recording outputs into `ctx`.
    async fn sign_request(&self, req: &mut RequestMessage, ctx: &mut SigningContext) -> Result<()>;
}
