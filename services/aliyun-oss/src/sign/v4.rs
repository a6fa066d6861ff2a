use std::fmt::Write;

use async_trait::async_trait;
use chrono::TimeDelta;
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderValue};
use log::debug;
use ossreq_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use ossreq_core::time::{format_date, format_http_date, format_iso8601, DateTime};
use ossreq_core::utils::uri_encode;
use ossreq_core::{Error, RequestMessage, Result, SigningRequest};

use super::{SignRequest, SigningContext, SigningMethod};
use crate::constants::*;

/// V4Signer signs requests with `OSS4-HMAC-SHA256`.
#[derive(Debug, Default, Clone, Copy)]
pub struct V4Signer;

impl V4Signer {
    /// Create a new V4 signer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SignRequest for V4Signer {
    async fn sign_request(&self, req: &mut RequestMessage, ctx: &mut SigningContext) -> Result<()> {
        let pending = prepare(req, ctx)?;
        let signature = signature(
            &pending.access_key_secret,
            &pending.date,
            &ctx.region,
            &ctx.product,
            &ctx.string_to_sign,
        );
        pending.finish(req, &signature)
    }
}

/// A V4 request whose string to sign is computed but not yet signed.
pub(crate) struct PendingSignature {
    sreq: SigningRequest,
    method: SigningMethod,
    pub(crate) access_key_id: String,
    access_key_secret: String,
    /// `YYYYMMDD` of the signing time.
    pub(crate) date: String,
    scope: String,
    additional_headers: Vec<String>,
}

/// Compute the string to sign of `req` and record it into `ctx`.
///
/// The uri and headers of `req` stay taken until
/// [`PendingSignature::finish`] puts them back.
pub(crate) fn prepare(req: &mut RequestMessage, ctx: &mut SigningContext) -> Result<PendingSignature> {
    let cred = ctx.signing_credential()?;
    let sign_time = ctx.signing_time();

    let expiration = match ctx.method {
        SigningMethod::Header => None,
        SigningMethod::Query => {
            let expiration = ctx.expiration.unwrap_or_else(|| default_expiration(sign_time));
            let expires = expiration.timestamp() - sign_time.timestamp();
            if expires > MAX_EXPIRES_V4.as_secs() as i64 {
                return Err(Error::expiration_too_long(format!(
                    "expires {expires}s exceeds the limit of {}s",
                    MAX_EXPIRES_V4.as_secs()
                )));
            }
            Some((expiration, expires))
        }
    };

    let datetime = format_iso8601(sign_time);
    let date = format_date(sign_time);
    let scope = format!(
        "{date}/{}/{}/{SIGNING_TERMINATOR_V4}",
        ctx.region, ctx.product
    );

    let mut sreq = SigningRequest::build(req)?;
    let additional_headers = additional_headers_to_sign(&sreq.headers, &ctx.additional_headers);

    match expiration {
        None => {
            if let Some(token) = &cred.security_token {
                sreq.header_insert(X_OSS_SECURITY_TOKEN, token)?;
            }
            sreq.header_insert(X_OSS_DATE, &datetime)?;
            sreq.header_insert("date", &format_http_date(sign_time))?;
            if !sreq.headers.contains_key(X_OSS_CONTENT_SHA256) {
                sreq.header_insert(X_OSS_CONTENT_SHA256, UNSIGNED_PAYLOAD)?;
            }
        }
        Some((expiration, expires)) => {
            if let Some(token) = &cred.security_token {
                sreq.query_push(X_OSS_SECURITY_TOKEN, token);
            }
            sreq.query_push(X_OSS_SIGNATURE_VERSION, SIGNING_ALGORITHM_V4);
            sreq.query_push(X_OSS_DATE, &datetime);
            sreq.query_push(X_OSS_EXPIRES, expires.to_string());
            sreq.query_push(X_OSS_CREDENTIAL, format!("{}/{scope}", cred.access_key_id));
            if !additional_headers.is_empty() {
                sreq.query_push(X_OSS_ADDITIONAL_HEADERS, additional_headers.join(";"));
            }
            ctx.expiration = Some(expiration);
        }
    }

    let canonical_request = canonical_request(&sreq, ctx, &additional_headers)?;
    debug!("calculated canonical request: {canonical_request}");

    let string_to_sign = format!(
        "{SIGNING_ALGORITHM_V4}\n{datetime}\n{scope}\n{}",
        hex_sha256(canonical_request.as_bytes())
    );
    debug!("calculated string to sign: {string_to_sign}");

    ctx.string_to_sign = string_to_sign;
    ctx.date_to_sign = Some(sign_time);
    ctx.scope_to_sign = scope.clone();
    ctx.additional_headers_to_sign = additional_headers.clone();

    Ok(PendingSignature {
        sreq,
        method: ctx.method,
        access_key_id: cred.access_key_id,
        access_key_secret: cred.access_key_secret,
        date,
        scope,
        additional_headers,
    })
}

impl PendingSignature {
    /// Attach `signature` and give the uri and headers back to `req`.
    pub(crate) fn finish(mut self, req: &mut RequestMessage, signature: &str) -> Result<()> {
        match self.method {
            SigningMethod::Header => {
                let mut auth = format!(
                    "{SIGNING_ALGORITHM_V4} Credential={}/{}",
                    self.access_key_id, self.scope
                );
                if !self.additional_headers.is_empty() {
                    write!(auth, ",AdditionalHeaders={}", self.additional_headers.join(";"))?;
                }
                write!(auth, ",Signature={signature}")?;

                let mut value: HeaderValue = auth.parse()?;
                value.set_sensitive(true);
                self.sreq.headers.insert(AUTHORIZATION, value);
            }
            SigningMethod::Query => self.sreq.query_push(X_OSS_SIGNATURE, signature),
        }

        self.sreq.apply(req)
    }
}

pub(crate) fn is_default_signed_header(name: &str) -> bool {
    name == "content-type" || name == CONTENT_MD5 || name.starts_with(OSS_HEADER_PREFIX)
}

/// Declared header names that are present and not signed anyway.
fn additional_headers_to_sign(headers: &HeaderMap, declared: &[String]) -> Vec<String> {
    let mut names: Vec<String> = declared
        .iter()
        .map(|v| v.to_lowercase())
        .filter(|v| !is_default_signed_header(v) && headers.contains_key(v.as_str()))
        .collect();
    names.sort();
    names.dedup();
    names
}

fn canonical_request(
    sreq: &SigningRequest,
    ctx: &SigningContext,
    additional_headers: &[String],
) -> Result<String> {
    let mut s = String::with_capacity(256);

    writeln!(s, "{}", sreq.method)?;
    writeln!(s, "{}", uri_encode(&ctx.canonical_uri(), true))?;

    let mut query: Vec<(String, String)> = sreq
        .query
        .iter()
        .map(|(k, v)| (uri_encode(k, false), uri_encode(v, false)))
        .collect();
    query.sort();
    let query = query
        .into_iter()
        .map(|(k, v)| if v.is_empty() { k } else { format!("{k}={v}") })
        .collect::<Vec<_>>()
        .join("&");
    writeln!(s, "{query}")?;

    let headers = sreq.header_to_vec_with_filter(|k| {
        is_default_signed_header(k) || additional_headers.iter().any(|h| h == k)
    })?;
    s.push_str(&SigningRequest::header_to_string(headers, ":", "\n"));
    s.push('\n');

    writeln!(s, "{}", additional_headers.join(";"))?;

    match sreq.header_get_or_default(X_OSS_CONTENT_SHA256)? {
        "" => s.push_str(UNSIGNED_PAYLOAD),
        v => s.push_str(v),
    }

    Ok(s)
}

/// Hex signature of `string_to_sign` under the derived V4 signing key.
pub(crate) fn signature(
    secret: &str,
    date: &str,
    region: &str,
    product: &str,
    string_to_sign: &str,
) -> String {
    let key = signing_key(secret, date, region, product);
    hex_hmac_sha256(&key, string_to_sign.as_bytes())
}

fn signing_key(secret: &str, date: &str, region: &str, product: &str) -> Vec<u8> {
    let key = format!("{SIGNING_KEY_PREFIX_V4}{secret}");
    let key = hmac_sha256(key.as_bytes(), date.as_bytes());
    let key = hmac_sha256(&key, region.as_bytes());
    let key = hmac_sha256(&key, product.as_bytes());
    hmac_sha256(&key, SIGNING_TERMINATOR_V4.as_bytes())
}

/// Expiration used when none is given: the signing time plus [`DEFAULT_EXPIRES`].
pub(crate) fn default_expiration(sign_time: DateTime) -> DateTime {
    sign_time + TimeDelta::seconds(DEFAULT_EXPIRES.as_secs() as i64)
}
