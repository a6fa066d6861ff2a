use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use ossreq_core::{Error, RequestMessage, Result};

use super::v4::prepare;
use super::{SignRequest, SigningContext};

/// SignatureDelegate computes V4 signatures outside this process.
///
/// The delegate receives these fields:
///
/// - `method`: HTTP method
/// - `bucket`, `key`: target resource, empty if unset
/// - `stringToSign`: the V4 string to sign
/// - `region`, `product`: scope parts
/// - `date`: scope date as `YYYYMMDD`
/// - `accessKeyId`: access key id of the credential
///
/// and must reply with a `signature` field holding the hex signature.
#[async_trait]
pub trait SignatureDelegate: Debug + Send + Sync + 'static {
    /// Sign the given fields.
    async fn sign(&self, fields: HashMap<String, String>) -> Result<HashMap<String, String>>;
}

/// RemoteSigner builds V4 requests but leaves the signature to a [`SignatureDelegate`].
///
/// The access key secret never leaves the delegate, so the credential used
/// here only needs a valid access key id and a placeholder secret.
#[derive(Debug, Clone)]
pub struct RemoteSigner {
    delegate: Arc<dyn SignatureDelegate>,
}

impl RemoteSigner {
    /// Create a signer calling `delegate`.
    pub fn new(delegate: impl SignatureDelegate) -> Self {
        Self {
            delegate: Arc::new(delegate),
        }
    }
}

#[async_trait]
impl SignRequest for RemoteSigner {
    async fn sign_request(&self, req: &mut RequestMessage, ctx: &mut SigningContext) -> Result<()> {
        let method = req.method.to_string();
        let pending = prepare(req, ctx)?;

        let fields = HashMap::from([
            ("method".to_string(), method),
            ("bucket".to_string(), ctx.bucket.clone().unwrap_or_default()),
            ("key".to_string(), ctx.key.clone().unwrap_or_default()),
            ("stringToSign".to_string(), ctx.string_to_sign.clone()),
            ("region".to_string(), ctx.region.clone()),
            ("product".to_string(), ctx.product.clone()),
            ("date".to_string(), pending.date.clone()),
            ("accessKeyId".to_string(), pending.access_key_id.clone()),
        ]);

        debug!("calling signature delegate: {:?}", self.delegate);
        let mut reply = self
            .delegate
            .sign(fields)
            .await
            .map_err(|e| Error::signature_call("signature delegate call failed").with_source(e))?;
        let signature = reply
            .remove("signature")
            .ok_or_else(|| Error::signature_result("missing signature field"))?;

        pending.finish(req, &signature)
    }
}
