//! Core components for executing OSS requests.
//!
//! This crate provides the service-agnostic building blocks of the ossreq
//! workspace: runtime [`Context`], the shared [`Error`] type, request and
//! response messages, credential traits and the single-flight
//! [`CredentialCache`].
//!
//! ## Overview
//!
//! - **Context**: holds the [`HttpSend`] used to reach the network and the
//!   [`Env`] used to read configuration.
//! - **Messages**: [`RequestMessage`] with a replayable-or-not [`Body`],
//!   and the fully received [`ResponseMessage`].
//! - **Credentials**: [`ProvideCredential`] sources, composed by
//!   [`ProvideCredentialChain`] and cached by [`CredentialCache`].
//!
//! ## Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use ossreq_core::{Context, CredentialCache, ProvideCredential, Result, SigningCredential};
//!
//! #[derive(Clone, Debug)]
//! struct MyCredential {
//!     key: String,
//! }
//!
//! impl SigningCredential for MyCredential {
//!     fn is_valid(&self) -> bool {
//!         !self.key.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MyProvider;
//!
//! #[async_trait]
//! impl ProvideCredential for MyProvider {
//!     type Credential = MyCredential;
//!
//!     async fn provide_credential(&self, _: &Context) -> Result<Option<MyCredential>> {
//!         Ok(Some(MyCredential {
//!             key: "my-key".to_string(),
//!         }))
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let cache = CredentialCache::new(MyProvider);
//! let cred = cache.get(&Context::new()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: Cryptographic hashing utilities
//! - [`time`]: Time formatting and parsing
//! - [`crc64`]: ECMA-182 CRC64 checksums
//! - [`utils`]: Percent encoding and data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod crc64;
pub mod hash;
pub mod time;
pub mod utils;

mod error;
pub use error::{Error, ErrorDetail, ErrorKind, Result, ServiceError};

mod context;
pub use context::{Context, Env, HttpSend, NoopEnv, NoopHttpSend, OsEnv, StaticEnv};

mod body;
pub use body::{Body, ByteStream, StreamBody};
mod message;
pub use message::{RequestMessage, ResponseMessage};
mod request;
pub use request::SigningRequest;

mod api;
pub use api::{ProvideCredential, SigningCredential};
mod chain;
pub use chain::ProvideCredentialChain;
mod cache;
pub use cache::{CredentialCache, DEFAULT_REFRESH_THRESHOLD};
