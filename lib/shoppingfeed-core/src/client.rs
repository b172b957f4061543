//! The adapter contract consumed by resource APIs.
//!
//! - [`HttpAdapter`] - send, batch-send and token derivation
//! - [`HttpAdapterExt`] - request shortcuts on top of any adapter
//! - [`SendOptions`] - per-call options
//!
//! Resource APIs (orders, catalog, ...) only depend on [`HttpAdapter`], so they
//! can be driven by the default adapter or by a test double.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use crate::{Method, Request, Response, Result};

/// Per-call options for [`HttpAdapter::send`] and [`HttpAdapter::batch_send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOptions {
    /// Extra headers merged into every request of the call.
    pub headers: HashMap<String, String>,
    /// Deadline for the whole exchange, retries included.
    pub timeout: Option<Duration>,
    /// Turn final 4xx/5xx responses into [`crate::Error::Http`].
    pub http_errors: bool,
    /// Maximum number of requests in flight during a batch.
    pub concurrency: usize,
}

impl SendOptions {
    /// Default number of concurrent requests in a batch.
    pub const DEFAULT_CONCURRENCY: usize = 25;

    /// Options with defaults: no extra header, no deadline, HTTP errors on.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header to every request of the call.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Bound the exchange duration.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Return 4xx/5xx responses as plain responses instead of errors.
    #[must_use]
    pub const fn without_http_errors(mut self) -> Self {
        self.http_errors = false;
        self
    }

    /// Set the batch concurrency (at least one request in flight).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            headers: HashMap::new(),
            timeout: None,
            http_errors: true,
            concurrency: Self::DEFAULT_CONCURRENCY,
        }
    }
}

/// Sends requests under a configured policy.
pub trait HttpAdapter: Clone + Send + Sync {
    /// Send one request through the middleware pipeline.
    ///
    /// Resolves once the pipeline settled: success, or the last failure once
    /// every retry policy gave up.
    fn send(
        &self,
        request: Request,
        options: &SendOptions,
    ) -> impl Future<Output = Result<Response>> + Send;

    /// Send requests concurrently and wait for all of them.
    ///
    /// Outcomes are returned in the order of `requests`.
    fn batch_send(
        &self,
        requests: Vec<Request>,
        options: &SendOptions,
    ) -> impl Future<Output = Vec<Result<Response>>> + Send;

    /// Derive an adapter authenticating every request with `token`.
    fn with_token(&self, token: &str) -> Result<Self>;
}

/// Extension trait for [`HttpAdapter`] with convenience methods.
pub trait HttpAdapterExt: HttpAdapter {
    /// Send a GET request with default options.
    fn get(&self, uri: &str) -> impl Future<Output = Result<Response>> + Send {
        let request = Request::new(Method::Get, uri);
        async move { self.send(request, &SendOptions::default()).await }
    }

    /// Send a request with a JSON body and default options.
    fn send_json<T: serde::Serialize + Sync>(
        &self,
        method: Method,
        uri: &str,
        body: &T,
    ) -> impl Future<Output = Result<Response>> + Send {
        let request = Request::builder(method, uri)
            .json(body)
            .map(crate::RequestBuilder::build);
        async move { self.send(request?, &SendOptions::default()).await }
    }
}

impl<T: HttpAdapter> HttpAdapterExt for T {}
