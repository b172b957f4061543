//! Ordered, named chain of policy middleware.

use std::fmt;
use std::slice;

use tower::Layer;

use crate::{
    ClientOptions,
    middleware::{
        BearerAuthLayer, LoggingLayer, RateLimitHandler, ServerErrorHandler, retry_layer,
    },
    service::{BoxedService, boxed},
};

/// One policy of a [`HandlerPipeline`].
#[derive(Debug, Clone)]
pub enum Middleware {
    /// Retry `429` responses.
    RateLimit(RateLimitHandler),
    /// Retry `5xx` responses and transient failures.
    ServerError(ServerErrorHandler),
    /// Report every physical attempt.
    Logger(LoggingLayer),
    /// Authenticate requests with a bearer token.
    TokenAuth(BearerAuthLayer),
}

impl Middleware {
    /// Name of the rate-limit entry.
    pub const RATE_LIMIT: &'static str = "rate_limit";
    /// Name of the server-error retry entry.
    pub const RETRY_COUNT: &'static str = "retry_count";
    /// Name of the logging entry.
    pub const LOGGER: &'static str = "logger";
    /// Name of the token authentication entry.
    pub const TOKEN_AUTH: &'static str = "token_auth";

    /// Name identifying the entry in a pipeline.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RateLimit(_) => Self::RATE_LIMIT,
            Self::ServerError(_) => Self::RETRY_COUNT,
            Self::Logger(_) => Self::LOGGER,
            Self::TokenAuth(_) => Self::TOKEN_AUTH,
        }
    }

    /// Wrap `service` with this policy.
    #[must_use]
    pub fn wrap(&self, service: BoxedService) -> BoxedService {
        match self {
            Self::RateLimit(handler) => boxed(retry_layer(handler.clone()).layer(service)),
            Self::ServerError(handler) => boxed(retry_layer(*handler).layer(service)),
            Self::Logger(layer) => boxed(layer.layer(service)),
            Self::TokenAuth(layer) => boxed(layer.layer(service)),
        }
    }
}

/// Ordered sequence of uniquely named middleware.
///
/// The first entry wraps outermost: on the way out it sees the request first,
/// on the way back it sees the outcome last. Adding an entry whose name is
/// already present replaces it, keeping its position.
///
/// # Example
///
/// ```ignore
/// use shoppingfeed::{HandlerPipeline, Middleware};
/// use shoppingfeed::middleware::{RateLimitHandler, ServerErrorHandler};
///
/// let pipeline = HandlerPipeline::new()
///     .with(Middleware::RateLimit(RateLimitHandler::new(5)))
///     .with(Middleware::ServerError(ServerErrorHandler::new(2)));
/// assert_eq!(pipeline.names(), ["rate_limit", "retry_count"]);
/// ```
#[derive(Clone, Default)]
pub struct HandlerPipeline {
    entries: Vec<Middleware>,
}

impl fmt::Debug for HandlerPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl HandlerPipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the pipeline described by `options`.
    ///
    /// Entries, outermost first: `rate_limit` when rate-limit handling is on,
    /// `retry_count` when server-error retries are enabled, `logger` when a
    /// logger is configured.
    #[must_use]
    pub fn from_options(options: &ClientOptions) -> Self {
        let mut pipeline = Self::new();

        if options.handle_rate_limit {
            let handler = RateLimitHandler::default().with_logger(options.logger.clone());
            pipeline.push(Middleware::RateLimit(handler));
        }

        if options.retry_on_server_error > 0 {
            let handler = ServerErrorHandler::new(options.retry_on_server_error);
            pipeline.push(Middleware::ServerError(handler));
        }

        if let Some(logger) = &options.logger {
            pipeline.push(Middleware::Logger(LoggingLayer::new(logger.clone())));
        }

        pipeline
    }

    /// Add an entry, builder style.
    #[must_use]
    pub fn with(mut self, middleware: Middleware) -> Self {
        self.push(middleware);
        self
    }

    /// Append an entry, or replace the entry of the same name in place.
    pub fn push(&mut self, middleware: Middleware) {
        let name = middleware.name();
        match self.entries.iter_mut().find(|entry| entry.name() == name) {
            Some(entry) => *entry = middleware,
            None => self.entries.push(middleware),
        }
    }

    /// Entry names, outermost first.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(Middleware::name).collect()
    }

    /// Whether an entry with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name() == name)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pipeline has no entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries, outermost first.
    pub fn iter(&self) -> slice::Iter<'_, Middleware> {
        self.entries.iter()
    }

    /// Wrap `transport` with every entry.
    #[must_use]
    pub fn layer(&self, transport: BoxedService) -> BoxedService {
        self.entries
            .iter()
            .rev()
            .fold(transport, |service, middleware| middleware.wrap(service))
    }
}

impl<'a> IntoIterator for &'a HandlerPipeline {
    type Item = &'a Middleware;
    type IntoIter = slice::Iter<'a, Middleware>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
