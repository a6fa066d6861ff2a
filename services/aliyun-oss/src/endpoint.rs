//! Endpoint and address style resolution.

use std::net::IpAddr;
use std::str::FromStr;

use http::uri::Authority;
use ossreq_core::utils::uri_encode;
use ossreq_core::{Error, Result};

use crate::constants::DEFAULT_ENDPOINT_SUFFIX;
use crate::Config;

/// How the bucket is placed into request urls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressStyle {
    /// `https://bucket.host/key`
    VirtualHosted,
    /// `https://host/bucket/key`
    Path,
    /// `https://host/key`, the host is bound to the bucket.
    Cname,
}

/// A resolved endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: String,
    host: String,
    style: AddressStyle,
}

impl Endpoint {
    /// Resolve the endpoint described by `config`.
    ///
    /// An explicit endpoint wins. Otherwise the region picks one of the dual-stack,
    /// internal, accelerate or default hosts, in that order of preference.
    pub fn resolve(config: &Config) -> Result<Self> {
        let default_scheme = if config.disable_ssl { "http" } else { "https" };

        let (scheme, host) = match &config.endpoint {
            Some(endpoint) => {
                let endpoint = endpoint.trim().trim_end_matches('/');
                match endpoint.split_once("://") {
                    Some((scheme, host)) => (scheme.to_lowercase(), host.to_string()),
                    None => (default_scheme.to_string(), endpoint.to_string()),
                }
            }
            None => {
                let region = config
                    .region
                    .as_deref()
                    .ok_or_else(|| Error::config_invalid("region or endpoint is required"))?;
                validate_region(region)?;
                (default_scheme.to_string(), region_host(config, region))
            }
        };

        if host.is_empty() {
            return Err(Error::config_invalid("endpoint host is empty"));
        }
        let authority = Authority::from_str(&host).map_err(|e| {
            Error::config_invalid(format!("endpoint {host} is invalid")).with_source(e)
        })?;

        let style = if is_ip_host(authority.host()) {
            AddressStyle::Path
        } else if config.use_cname {
            AddressStyle::Cname
        } else if config.use_path_style {
            AddressStyle::Path
        } else {
            AddressStyle::VirtualHosted
        };

        Ok(Self {
            scheme,
            host,
            style,
        })
    }

    /// The url scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The host, including the port if any.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The address style.
    pub fn style(&self) -> AddressStyle {
        self.style
    }

    /// Build the url of `bucket` and `key` without query.
    pub fn url(&self, bucket: Option<&str>, key: Option<&str>) -> String {
        let key = key.map(|k| uri_encode(k, true)).unwrap_or_default();
        match (bucket, self.style) {
            (Some(bucket), AddressStyle::VirtualHosted) => {
                format!("{}://{bucket}.{}/{key}", self.scheme, self.host)
            }
            (Some(bucket), AddressStyle::Path) => {
                format!("{}://{}/{bucket}/{key}", self.scheme, self.host)
            }
            _ => format!("{}://{}/{key}", self.scheme, self.host),
        }
    }
}

fn region_host(config: &Config, region: &str) -> String {
    if config.use_dualstack_endpoint {
        format!("{region}.oss.{DEFAULT_ENDPOINT_SUFFIX}")
    } else if config.use_internal_endpoint {
        format!("oss-{region}-internal.{DEFAULT_ENDPOINT_SUFFIX}")
    } else if config.use_accelerate_endpoint {
        format!("oss-accelerate.{DEFAULT_ENDPOINT_SUFFIX}")
    } else {
        format!("oss-{region}.{DEFAULT_ENDPOINT_SUFFIX}")
    }
}

fn is_ip_host(host: &str) -> bool {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok()
}

/// Region names only contain lowercase letters, digits and `-`.
pub fn validate_region(region: &str) -> Result<()> {
    if region.is_empty()
        || !region
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err(Error::config_invalid(format!("region {region:?} is invalid")));
    }
    Ok(())
}

/// Bucket names are 3 to 63 characters of lowercase letters, digits and `-`,
/// and can't start or end with `-`.
pub fn validate_bucket_name(bucket: &str) -> Result<()> {
    let valid = (3..=63).contains(&bucket.len())
        && bucket
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !bucket.starts_with('-')
        && !bucket.ends_with('-');
    if !valid {
        return Err(Error::request_invalid(format!(
            "bucket name {bucket:?} is invalid"
        )));
    }
    Ok(())
}

/// Object keys must not be empty.
pub fn validate_object_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::request_invalid("object key is empty"));
    }
    Ok(())
}
