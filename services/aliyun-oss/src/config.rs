use std::time::Duration;

use super::constants::*;
use ossreq_core::Context;

/// Signature protocol used to authenticate requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureVersion {
    /// Legacy HMAC-SHA1 signature.
    V1,
    /// `OSS4-HMAC-SHA256` signature.
    #[default]
    V4,
}

/// Switches for optional behaviors of the request pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Adjust the signing time after the server reports a skewed clock.
    pub correct_clock_skew: bool,
    /// Compare the CRC64 of uploaded bodies against `x-oss-hash-crc64ecma`.
    pub enable_crc64_check_upload: bool,
    /// Compare the CRC64 of downloaded bodies against `x-oss-hash-crc64ecma`.
    pub enable_crc64_check_download: bool,
    /// Fill `Content-Type` from the object key extension on uploads.
    pub auto_detect_mime_type: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            correct_clock_skew: true,
            enable_crc64_check_upload: true,
            enable_crc64_check_download: true,
            auto_detect_mime_type: true,
        }
    }
}

/// Config carries all the configuration for the oss client.
#[derive(Clone, Debug)]
pub struct Config {
    /// `region` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`OSS_REGION`]
    pub region: Option<String>,
    /// `endpoint` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`OSS_ENDPOINT`]
    ///
    /// An explicit endpoint wins over everything derived from `region`.
    pub endpoint: Option<String>,
    /// Signature protocol, default to V4.
    pub signature_version: SignatureVersion,
    /// Product name in the V4 scope, default to `oss`.
    pub product: String,
    /// Use the internal (VPC) endpoint of the region.
    pub use_internal_endpoint: bool,
    /// Use the global transfer acceleration endpoint.
    pub use_accelerate_endpoint: bool,
    /// Use the dual-stack (IPv4 and IPv6) endpoint.
    pub use_dualstack_endpoint: bool,
    /// The endpoint is a custom domain bound to the bucket.
    pub use_cname: bool,
    /// Put the bucket into the path instead of the host.
    pub use_path_style: bool,
    /// Use `http` for endpoints without scheme.
    pub disable_ssl: bool,
    /// Maximum attempts per call, including the first one.
    pub retry_max_attempts: Option<usize>,
    /// Timeout of each transport call.
    pub readwrite_timeout: Option<Duration>,
    /// Extra header names to include in V4 signatures.
    pub additional_headers: Vec<String>,
    /// Appended to the default user agent.
    pub user_agent: Option<String>,
    /// Optional pipeline behaviors.
    pub feature_flags: FeatureFlags,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: None,
            endpoint: None,
            signature_version: SignatureVersion::V4,
            product: DEFAULT_PRODUCT.to_string(),
            use_internal_endpoint: false,
            use_accelerate_endpoint: false,
            use_dualstack_endpoint: false,
            use_cname: false,
            use_path_style: false,
            disable_ssl: false,
            retry_max_attempts: None,
            readwrite_timeout: None,
            additional_headers: Vec::new(),
            user_agent: None,
            feature_flags: FeatureFlags::default(),
        }
    }
}

impl Config {
    /// Load config from env.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if let Some(v) = ctx.env_var(OSS_REGION) {
            self.region.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(OSS_ENDPOINT) {
            self.endpoint.get_or_insert(v);
        }

        self
    }

    /// Set the region.
    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    /// Set the signature version.
    pub fn with_signature_version(mut self, version: SignatureVersion) -> Self {
        self.signature_version = version;
        self
    }

    /// Set the maximum attempts of each call.
    pub fn with_retry_max_attempts(mut self, attempts: usize) -> Self {
        self.retry_max_attempts = Some(attempts);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ossreq_core::StaticEnv;
    use std::collections::HashMap;

    #[test]
    fn test_from_env() {
        let ctx = Context::new().with_env(StaticEnv {
            envs: HashMap::from([
                (OSS_REGION.to_string(), "cn-beijing".to_string()),
                (OSS_ENDPOINT.to_string(), "oss-cn-beijing.aliyuncs.com".to_string()),
            ]),
        });

        let cfg = Config::default().from_env(&ctx);
        assert_eq!(cfg.region.as_deref(), Some("cn-beijing"));
        assert_eq!(cfg.endpoint.as_deref(), Some("oss-cn-beijing.aliyuncs.com"));
        assert_eq!(cfg.signature_version, SignatureVersion::V4);

        // Explicit values win over env.
        let cfg = Config::default().with_region("cn-hangzhou").from_env(&ctx);
        assert_eq!(cfg.region.as_deref(), Some("cn-hangzhou"));
    }
}
