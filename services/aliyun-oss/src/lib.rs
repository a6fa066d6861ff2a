//! Request execution for Alibaba Cloud Object Storage Service (OSS).
//!
//! This crate turns a logical operation into a signed HTTP exchange with OSS:
//! it resolves the endpoint, loads and caches credentials, signs with V1 or
//! V4, retries transient failures and checks the response.
//!
//! ## Overview
//!
//! Every [`Client::execute`] call runs through a [`MiddlewareStack`]:
//!
//! ```text
//! retry -> sign -> check -> transport
//! ```
//!
//! - **retry** replays the request with backoff while the [`Retryer`] allows
//!   it, and corrects the signing clock after `RequestTimeTooSkewed`.
//! - **sign** fetches a credential and signs every attempt afresh.
//! - **check** turns non-2xx responses into service errors and verifies
//!   CRC64 checksums.
//! - **transport** sends the request through the [`ossreq_core::HttpSend`]
//!   of the context.
//!
//! [`Client::presign`] signs into the query string instead, producing a url
//! that can be shared.
//!
//! ## Quick Start
//!
//! ```no_run
//! use http::Method;
//! use ossreq_aliyun_oss::{
//!     Client, Config, ExecuteOptions, OperationInput, PresignOptions,
//!     StaticCredentialProvider,
//! };
//! use ossreq_core::{Context, Result};
//! use ossreq_http_send_reqwest::ReqwestHttpSend;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let ctx = Context::new().with_http_send(ReqwestHttpSend::default());
//!
//!     let client = Client::builder(Config::default().with_region("cn-hangzhou"))
//!         .with_context(ctx)
//!         .with_credential_provider(StaticCredentialProvider::new(
//!             "your-access-key-id",
//!             "your-access-key-secret",
//!         ))
//!         .build()?;
//!
//!     let output = client
//!         .execute(
//!             OperationInput::new(Method::GET)
//!                 .with_bucket("examplebucket")
//!                 .with_key("exampleobject.txt"),
//!             ExecuteOptions::default(),
//!         )
//!         .await?;
//!     println!("status: {}", output.status);
//!
//!     let presigned = client
//!         .presign(
//!             OperationInput::new(Method::GET)
//!                 .with_bucket("examplebucket")
//!                 .with_key("exampleobject.txt"),
//!             PresignOptions::default(),
//!         )
//!         .await?;
//!     println!("url: {}", presigned.url);
//!     Ok(())
//! }
//! ```
//!
//! ## Credential Sources
//!
//! [`DefaultCredentialProvider`] reads the environment:
//!
//! ```bash
//! export OSS_ACCESS_KEY_ID=your-access-key-id
//! export OSS_ACCESS_KEY_SECRET=your-access-key-secret
//! export OSS_SESSION_TOKEN=your-sts-token  # Optional, for STS
//! ```
//!
//! Use [`StaticCredentialProvider`] for fixed keys,
//! [`ClosureCredentialProvider`] to plug in any async source, or
//! [`AnonymousCredentialProvider`] to send unsigned requests. All of them are
//! cached by [`RefreshingCredentialProvider`] inside the client.
//!
//! ## Signing Without A Client
//!
//! Signers work on a [`ossreq_core::RequestMessage`] and a
//! [`SigningContext`]:
//!
//! ```
//! use http::Method;
//! use ossreq_aliyun_oss::{Credential, SignRequest, SigningContext, V4Signer};
//! use ossreq_core::RequestMessage;
//!
//! # async fn example() -> ossreq_core::Result<()> {
//! let mut req = RequestMessage::new(
//!     Method::GET,
//!     "https://bucket.oss-cn-hangzhou.aliyuncs.com/key".parse()?,
//! );
//! let mut ctx = SigningContext::new("cn-hangzhou")
//!     .with_bucket("bucket")
//!     .with_key("key")
//!     .with_credential(Credential::new("ak", "sk"));
//!
//! V4Signer::new().sign_request(&mut req, &mut ctx).await?;
//! assert!(req.header("authorization").is_some());
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

mod constants;

mod config;
pub use config::{Config, FeatureFlags, SignatureVersion};

mod credential;
pub use credential::Credential;

mod provide_credential;
pub use provide_credential::*;

mod sign;
pub use sign::{
    RemoteSigner, SignRequest, SignatureDelegate, SigningContext, SigningMethod, V1Signer,
    V4Signer,
};

mod endpoint;
pub use endpoint::{
    validate_bucket_name, validate_object_key, validate_region, AddressStyle, Endpoint,
};

pub mod retry;
pub use retry::{Retryer, StandardRetryer};

mod error_body;
pub use error_body::{parse_error_xml, BAD_ERROR_RESPONSE};

mod execute;
pub use execute::{
    ExecuteContext, ExecuteOptions, OperationInput, OperationOutput, PresignOptions,
    PresignResult, ProgressFn, ResponseHandler,
};

pub mod middleware;
pub use middleware::{Handler, MiddlewareStack};

mod mime;
pub use mime::guess_content_type;

mod client;
pub use client::{Client, ClientBuilder};
