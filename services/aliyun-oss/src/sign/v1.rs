use std::collections::HashSet;
use std::fmt::Write;

use async_trait::async_trait;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::HeaderValue;
use log::debug;
use once_cell::sync::Lazy;
use ossreq_core::hash::base64_hmac_sha1;
use ossreq_core::time::{format_http_date, DateTime};
use ossreq_core::{RequestMessage, Result, SigningRequest};

use super::v4::default_expiration;
use super::{SignRequest, SigningContext, SigningMethod};
use crate::constants::*;
use crate::Credential;

/// V1Signer signs requests with the legacy HMAC-SHA1 protocol.
#[derive(Debug, Default, Clone, Copy)]
pub struct V1Signer;

impl V1Signer {
    /// Create a new V1 signer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SignRequest for V1Signer {
    async fn sign_request(&self, req: &mut RequestMessage, ctx: &mut SigningContext) -> Result<()> {
        let cred = ctx.signing_credential()?;
        let sign_time = ctx.signing_time();

        let mut sreq = SigningRequest::build(req)?;
        match ctx.method {
            SigningMethod::Header => sign_header(&mut sreq, ctx, &cred, sign_time)?,
            SigningMethod::Query => sign_query(&mut sreq, ctx, &cred, sign_time)?,
        }
        ctx.date_to_sign = Some(sign_time);

        sreq.apply(req)
    }
}

fn sign_header(
    sreq: &mut SigningRequest,
    ctx: &mut SigningContext,
    cred: &Credential,
    sign_time: DateTime,
) -> Result<()> {
    let date = format_http_date(sign_time);
    sreq.header_insert("date", &date)?;
    if let Some(token) = &cred.security_token {
        sreq.header_insert(X_OSS_SECURITY_TOKEN, token)?;
    }

    let string_to_sign = string_to_sign(sreq, ctx, &date)?;
    let signature = base64_hmac_sha1(
        cred.access_key_secret.as_bytes(),
        string_to_sign.as_bytes(),
    );
    ctx.string_to_sign = string_to_sign;

    let mut value: HeaderValue = format!("OSS {}:{signature}", cred.access_key_id).parse()?;
    value.set_sensitive(true);
    sreq.headers.insert(AUTHORIZATION, value);
    Ok(())
}

fn sign_query(
    sreq: &mut SigningRequest,
    ctx: &mut SigningContext,
    cred: &Credential,
    sign_time: DateTime,
) -> Result<()> {
    let expiration = ctx.expiration.unwrap_or_else(|| default_expiration(sign_time));
    let expires = expiration.timestamp().to_string();

    if let Some(token) = &cred.security_token {
        sreq.query_push(SECURITY_TOKEN_QUERY, token);
    }

    let string_to_sign = string_to_sign(sreq, ctx, &expires)?;
    let signature = base64_hmac_sha1(
        cred.access_key_secret.as_bytes(),
        string_to_sign.as_bytes(),
    );
    ctx.string_to_sign = string_to_sign;
    ctx.expiration = Some(expiration);

    sreq.query_push(OSS_ACCESS_KEY_ID_QUERY, &cred.access_key_id);
    sreq.query_push(EXPIRES_QUERY, expires);
    sreq.query_push(SIGNATURE_QUERY, signature);
    Ok(())
}

/// Construct string to sign
///
/// ## Format
///
/// ```text
/// VERB + "\n" +
/// Content-MD5 + "\n" +
/// Content-Type + "\n" +
/// Date + "\n" +
/// CanonicalizedOSSHeaders +
/// CanonicalizedResource
/// ```
fn string_to_sign(sreq: &SigningRequest, ctx: &SigningContext, date: &str) -> Result<String> {
    let mut s = String::new();
    writeln!(s, "{}", sreq.method.as_str())?;
    writeln!(s, "{}", sreq.header_get_or_default(CONTENT_MD5)?)?;
    writeln!(s, "{}", sreq.header_get_or_default(CONTENT_TYPE.as_str())?)?;
    writeln!(s, "{date}")?;

    let headers = sreq.header_to_vec_with_filter(|k| k.starts_with(OSS_HEADER_PREFIX))?;
    s.push_str(&SigningRequest::header_to_string(headers, ":", "\n"));
    s.push_str(&canonicalized_resource(sreq, ctx));

    debug!("calculated string to sign: {s}");
    Ok(s)
}

/// `/bucket/key` plus the sorted sub-resources of the query.
fn canonicalized_resource(sreq: &SigningRequest, ctx: &SigningContext) -> String {
    let mut params: Vec<(&str, &str)> = sreq
        .query
        .iter()
        .filter(|(k, _)| is_sub_resource(k, &ctx.sub_resource))
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    params.sort();

    let mut s = ctx.canonical_uri();
    for (idx, (k, v)) in params.into_iter().enumerate() {
        s.push(if idx == 0 { '?' } else { '&' });
        s.push_str(k);
        if !v.is_empty() {
            s.push('=');
            s.push_str(v);
        }
    }
    s
}

fn is_sub_resource(key: &str, extra: &[String]) -> bool {
    SUB_RESOURCES.contains(key)
        || key.starts_with(OSS_HEADER_PREFIX)
        || extra.iter().any(|v| v == key)
}

/// Query keys that take part in the canonicalized resource.
static SUB_RESOURCES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "acl",
        "uploads",
        "location",
        "cors",
        "logging",
        "website",
        "referer",
        "lifecycle",
        "delete",
        "append",
        "tagging",
        "objectMeta",
        "uploadId",
        "partNumber",
        "security-token",
        "position",
        "img",
        "style",
        "styleName",
        "replication",
        "replicationProgress",
        "replicationLocation",
        "cname",
        "bucketInfo",
        "comp",
        "qos",
        "live",
        "status",
        "vod",
        "startTime",
        "endTime",
        "symlink",
        "response-content-type",
        "response-content-language",
        "response-expires",
        "response-cache-control",
        "response-content-disposition",
        "response-content-encoding",
        "udf",
        "udfName",
        "udfImage",
        "udfId",
        "udfImageDesc",
        "udfApplication",
        "udfApplicationLog",
        "restore",
        "callback",
        "callback-var",
        "qosInfo",
        "policy",
        "stat",
        "encryption",
        "versions",
        "versioning",
        "versionId",
        "requestPayment",
        "sequential",
        "inventory",
        "inventoryId",
        "continuation-token",
        "asyncFetch",
        "worm",
        "wormId",
        "wormExtend",
        "withHashContext",
        "transferAcceleration",
        "regionList",
        "cloudboxes",
        "metaQuery",
        "resourceGroup",
        "rtc",
        "accessPoint",
        "accessPointPolicy",
        "httpsConfig",
        "publicAccessBlock",
        "policyStatus",
        "redundancyTransition",
        "dataRedundancyType",
        "targetRedundancyType",
        "redundancyTransitionTaskid",
        "responseHeader",
        "archiveDirectRead",
    ])
});
