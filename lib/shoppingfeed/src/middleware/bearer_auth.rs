//! Bearer token authentication middleware.
//!
//! Sets `Authorization: Bearer <token>` on every outgoing request, replacing
//! any value already present.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::{Layer, Service};

use crate::{Error, Request, Response, Result};

/// Layer that adds bearer token authentication to requests.
///
/// Surrounding whitespace is stripped from the token.
///
/// # Example
///
/// ```ignore
/// use shoppingfeed::middleware::BearerAuthLayer;
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(BearerAuthLayer::new("my-api-token"))
///     .service(transport);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct BearerAuthLayer {
    token: Arc<str>,
}

impl fmt::Debug for BearerAuthLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuthLayer")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl BearerAuthLayer {
    /// Create a bearer auth layer with the given token.
    pub fn new(token: impl AsRef<str>) -> Self {
        Self {
            token: Arc::from(token.as_ref().trim()),
        }
    }

    /// The trimmed token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl<S> Layer<S> for BearerAuthLayer {
    type Service = BearerAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BearerAuth {
            inner,
            token: Arc::clone(&self.token),
        }
    }
}

/// Service that adds bearer token authentication to requests.
#[derive(Clone)]
pub struct BearerAuth<S> {
    inner: S,
    token: Arc<str>,
}

impl<S: fmt::Debug> fmt::Debug for BearerAuth<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuth")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S> BearerAuth<S> {
    /// Create a bearer auth service wrapping the given service.
    pub fn new(inner: S, token: impl AsRef<str>) -> Self {
        Self {
            inner,
            token: Arc::from(token.as_ref().trim()),
        }
    }
}

impl<S> Service<Request> for BearerAuth<S>
where
    S: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        request.set_header("Authorization", format!("Bearer {}", self.token));

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(request).await })
    }
}
