//! The request pipeline.
//!
//! Each middleware wraps the next handler. The default stack is
//! `retry -> sign -> check -> transport`.

use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::debug;
use ossreq_core::{RequestMessage, ResponseMessage, Result};

use crate::ExecuteContext;

mod check;
pub use check::ResponseCheckMiddleware;
mod retry;
pub use retry::RetryMiddleware;
mod sign;
pub use sign::SignMiddleware;
mod transport;
pub use transport::TransportHandler;

/// Handler turns a request into a response.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handle one request.
    async fn handle(&self, req: RequestMessage, ctx: &mut ExecuteContext)
        -> Result<ResponseMessage>;
}

/// Middleware wraps a handler into another one.
pub type Middleware = Box<dyn Fn(Arc<dyn Handler>) -> Arc<dyn Handler> + Send + Sync>;

/// An ordered list of middlewares around a transport handler.
///
/// The composed handler is built on first use and reused afterwards.
pub struct MiddlewareStack {
    transport: Arc<dyn Handler>,
    middlewares: Vec<(String, Middleware)>,
    resolved: Mutex<Option<Arc<dyn Handler>>>,
}

impl MiddlewareStack {
    /// Create a stack calling `transport` directly.
    pub fn new(transport: impl Handler) -> Self {
        Self {
            transport: Arc::new(transport),
            middlewares: Vec::new(),
            resolved: Mutex::new(None),
        }
    }

    /// Add a middleware inside all previously pushed ones.
    pub fn push(
        mut self,
        name: &str,
        middleware: impl Fn(Arc<dyn Handler>) -> Arc<dyn Handler> + Send + Sync + 'static,
    ) -> Self {
        self.middlewares
            .push((name.to_string(), Box::new(middleware)));
        // A changed list must not reuse a handler built from the old one.
        *self.resolved.get_mut().expect("lock poisoned") = None;
        self
    }

    /// Names of the middlewares, outermost first.
    pub fn names(&self) -> Vec<&str> {
        self.middlewares.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// The composed handler.
    pub fn resolve(&self) -> Arc<dyn Handler> {
        let mut resolved = self.resolved.lock().expect("lock poisoned");
        if let Some(handler) = resolved.as_ref() {
            return handler.clone();
        }

        debug!("building middleware stack: {:?}", self.names());
        let handler = self
            .middlewares
            .iter()
            .rev()
            .fold(self.transport.clone(), |next, (_, middleware)| middleware(next));
        *resolved = Some(handler.clone());
        handler
    }

    /// Send `req` through the composed handler.
    pub async fn handle(
        &self,
        req: RequestMessage,
        ctx: &mut ExecuteContext,
    ) -> Result<ResponseMessage> {
        self.resolve().handle(req, ctx).await
    }
}

impl Debug for MiddlewareStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareStack")
            .field("middlewares", &self.names())
            .finish_non_exhaustive()
    }
}
