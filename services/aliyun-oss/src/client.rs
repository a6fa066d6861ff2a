use std::collections::HashMap;
use std::sync::Arc;

use http::header::{CONTENT_TYPE, USER_AGENT};
use http::{HeaderValue, Method, Uri};
use log::debug;
use ossreq_core::{Context, Error, ProvideCredential, RequestMessage, Result, SigningRequest};

use crate::constants::DEFAULT_READWRITE_TIMEOUT;
use crate::endpoint::{validate_bucket_name, validate_object_key, Endpoint};
use crate::middleware::{
    Handler, MiddlewareStack, ResponseCheckMiddleware, RetryMiddleware, SignMiddleware,
    TransportHandler,
};
use crate::mime::guess_content_type;
use crate::retry::{Retryer, StandardRetryer};
use crate::sign::{is_default_signed_header, SignRequest, SigningContext, V1Signer, V4Signer};
use crate::{
    Config, Credential, DefaultCredentialProvider, ExecuteContext, ExecuteOptions,
    OperationInput, OperationOutput, PresignOptions, PresignResult, RefreshingCredentialProvider,
    SignatureVersion,
};

type DynProvider = Arc<dyn ProvideCredential<Credential = Credential>>;

/// Builder of [`Client`].
#[derive(Debug)]
pub struct ClientBuilder {
    config: Config,
    ctx: Context,
    provider: Option<DynProvider>,
    signer: Option<Arc<dyn SignRequest>>,
    retryer: Option<Arc<dyn Retryer>>,
}

impl ClientBuilder {
    /// Start building a client for `config`.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ctx: Context::new(),
            provider: None,
            signer: None,
            retryer: None,
        }
    }

    /// Set the context providing http transport and env.
    pub fn with_context(mut self, ctx: Context) -> Self {
        self.ctx = ctx;
        self
    }

    /// Set the credential provider, [`DefaultCredentialProvider`] by default.
    ///
    /// The provider is always wrapped in a [`RefreshingCredentialProvider`].
    pub fn with_credential_provider(
        mut self,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Set the signer, picked from [`Config::signature_version`] by default.
    pub fn with_signer(mut self, signer: impl SignRequest) -> Self {
        self.signer = Some(Arc::new(signer));
        self
    }

    /// Set the retryer, [`StandardRetryer`] by default.
    pub fn with_retryer(mut self, retryer: impl Retryer) -> Self {
        self.retryer = Some(Arc::new(retryer));
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client> {
        let config = self.config;
        let endpoint = Endpoint::resolve(&config)?;

        let signer: Arc<dyn SignRequest> = match self.signer {
            Some(signer) => signer,
            None => match config.signature_version {
                SignatureVersion::V1 => Arc::new(V1Signer::new()),
                SignatureVersion::V4 => Arc::new(V4Signer::new()),
            },
        };
        if config.signature_version == SignatureVersion::V4 && config.region.is_none() {
            return Err(Error::config_invalid("region is required by V4 signatures"));
        }

        let provider: DynProvider = match self.provider {
            Some(provider) => Arc::new(RefreshingCredentialProvider::new(provider)),
            None => Arc::new(RefreshingCredentialProvider::new(
                DefaultCredentialProvider::new(),
            )),
        };
        let retryer = self
            .retryer
            .unwrap_or_else(|| Arc::new(StandardRetryer::new()));

        let flags = config.feature_flags;
        let stack = {
            let ctx = self.ctx.clone();
            let signer = signer.clone();
            let provider = provider.clone();
            MiddlewareStack::new(TransportHandler::new(
                self.ctx.clone(),
                config.readwrite_timeout.unwrap_or(DEFAULT_READWRITE_TIMEOUT),
            ))
            .push("retry", move |next: Arc<dyn Handler>| -> Arc<dyn Handler> {
                Arc::new(RetryMiddleware::new(
                    next,
                    retryer.clone(),
                    flags.correct_clock_skew,
                ))
            })
            .push("sign", move |next: Arc<dyn Handler>| -> Arc<dyn Handler> {
                Arc::new(SignMiddleware::new(
                    next,
                    ctx.clone(),
                    signer.clone(),
                    provider.clone(),
                ))
            })
            .push("check", move |next: Arc<dyn Handler>| -> Arc<dyn Handler> {
                Arc::new(ResponseCheckMiddleware::new(
                    next,
                    flags.enable_crc64_check_upload,
                    flags.enable_crc64_check_download,
                ))
            })
        };

        let mut user_agent = format!(
            "ossreq/{} ({}; {})",
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            std::env::consts::ARCH
        );
        if let Some(suffix) = config.user_agent.as_deref().filter(|v| !v.is_empty()) {
            user_agent.push('/');
            user_agent.push_str(suffix);
        }
        let user_agent = HeaderValue::from_str(&user_agent)?;

        Ok(Client {
            config,
            ctx: self.ctx,
            endpoint,
            signer,
            provider,
            stack,
            user_agent,
        })
    }
}

/// Client executes and presigns OSS operations.
///
/// A client is cheap to share: wrap it in an [`Arc`] and call it from as many
/// tasks as needed.
#[derive(Debug)]
pub struct Client {
    config: Config,
    ctx: Context,
    endpoint: Endpoint,
    signer: Arc<dyn SignRequest>,
    provider: DynProvider,
    stack: MiddlewareStack,
    user_agent: HeaderValue,
}

impl Client {
    /// Start building a client for `config`.
    pub fn builder(config: Config) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    /// The config of this client.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The resolved endpoint.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// The `User-Agent` sent with every request.
    pub fn user_agent(&self) -> &str {
        self.user_agent.to_str().unwrap_or_default()
    }

    /// Send `input` through the signing, retrying and checking pipeline.
    pub async fn execute(
        &self,
        input: OperationInput,
        options: ExecuteOptions,
    ) -> Result<OperationOutput> {
        let signing = self.signing_context(&input);
        let mut req = self.build_request(input)?;
        req.headers.insert(USER_AGENT, self.user_agent.clone());

        let mut ctx = ExecuteContext::new(signing, options);
        ctx.retry_max_attempts = ctx.retry_max_attempts.or(self.config.retry_max_attempts);

        let resp = self.stack.handle(req, &mut ctx).await?;
        Ok(resp.into())
    }

    /// Build a presigned url of `input`.
    ///
    /// Without credential the unsigned url is returned.
    pub async fn presign(
        &self,
        input: OperationInput,
        options: PresignOptions,
    ) -> Result<PresignResult> {
        let mut signing = self.signing_context(&input).with_query(options.expiration);
        let mut req = self.build_request(input)?;

        let expiration = match self.provider.provide_credential(&self.ctx).await? {
            Some(cred) => {
                signing.credential = Some(cred);
                self.signer.sign_request(&mut req, &mut signing).await?;
                signing.expiration
            }
            None => {
                debug!("no credential provided, presign returns the unsigned url");
                None
            }
        };

        // Only headers covered by the signature must be replayed by the caller.
        let signed_headers = req
            .headers
            .iter()
            .filter(|(k, _)| {
                is_default_signed_header(k.as_str())
                    || signing.additional_headers_to_sign.iter().any(|h| h == k.as_str())
            })
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect::<HashMap<_, _>>();

        Ok(PresignResult {
            method: req.method.clone(),
            url: req.uri.to_string(),
            expiration,
            signed_headers,
        })
    }

    fn signing_context(&self, input: &OperationInput) -> SigningContext {
        SigningContext {
            bucket: input.bucket.clone(),
            key: input.key.clone(),
            region: self.config.region.clone().unwrap_or_default(),
            product: self.config.product.clone(),
            additional_headers: self.config.additional_headers.clone(),
            ..Default::default()
        }
    }

    fn build_request(&self, input: OperationInput) -> Result<RequestMessage> {
        let OperationInput {
            method,
            bucket,
            key,
            mut headers,
            parameters,
            body,
        } = input;

        if let Some(bucket) = &bucket {
            validate_bucket_name(bucket)?;
        }
        if let Some(key) = &key {
            if bucket.is_none() {
                return Err(Error::request_invalid("object key is set without bucket"));
            }
            validate_object_key(key)?;
        }

        let mut url = self.endpoint.url(bucket.as_deref(), key.as_deref());
        if !parameters.is_empty() {
            url.push('?');
            url.push_str(&SigningRequest::query_to_encoded_string(&parameters));
        }
        let uri: Uri = url.parse()?;

        if self.config.feature_flags.auto_detect_mime_type
            && matches!(method, Method::PUT | Method::POST)
            && !headers.contains_key(CONTENT_TYPE)
        {
            if let Some(content_type) = key.as_deref().and_then(guess_content_type) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
        }

        Ok(RequestMessage {
            method,
            uri,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ossreq_core::ErrorKind;

    #[test]
    fn test_build_requires_region_for_v4() {
        let err = Client::builder(Config::default().with_endpoint("oss.example.com"))
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let client = Client::builder(
            Config::default()
                .with_endpoint("oss.example.com")
                .with_signature_version(SignatureVersion::V1),
        )
        .build()
        .unwrap();
        assert_eq!(client.endpoint().host(), "oss.example.com");
    }

    #[test]
    fn test_user_agent() {
        let mut config = Config::default().with_region("cn-hangzhou");
        config.user_agent = Some("my-app".to_string());
        let client = Client::builder(config).build().unwrap();
        assert!(client.user_agent().starts_with("ossreq/"));
        assert!(client.user_agent().ends_with("/my-app"));
    }

    #[test]
    fn test_build_request() -> Result<()> {
        let client = Client::builder(Config::default().with_region("cn-hangzhou")).build()?;

        let req = client.build_request(
            OperationInput::new(Method::PUT)
                .with_bucket("bucket")
                .with_key("dir/photo.png")
                .with_parameter("acl", "")
                .with_parameter("prefix", "a b+c"),
        )?;
        assert_eq!(
            req.uri.to_string(),
            "https://bucket.oss-cn-hangzhou.aliyuncs.com/dir/photo.png?acl&prefix=a%20b%2Bc"
        );
        assert_eq!(req.header("content-type"), Some("image/png"));

        let err = client
            .build_request(OperationInput::new(Method::GET).with_bucket("Invalid_Bucket"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestInvalid);

        let err = client
            .build_request(OperationInput::new(Method::GET).with_key("key"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestInvalid);
        Ok(())
    }
}
