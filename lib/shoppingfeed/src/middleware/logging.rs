//! Request/response logging middleware.
//!
//! Placed innermost in the pipeline, so every physical attempt (retries
//! included) is reported once to the configured [`Logger`](crate::Logger).

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{Instrument, Level, span};

use crate::{Error, LogLevel, Request, Response, Result, logger::SharedLogger};

/// Layer that reports exchanges to a logger sink.
///
/// # Example
///
/// ```ignore
/// use shoppingfeed::TracingLogger;
/// use shoppingfeed::middleware::LoggingLayer;
/// use tower::ServiceBuilder;
///
/// let service = ServiceBuilder::new()
///     .layer(LoggingLayer::new(TracingLogger::shared()))
///     .service(transport);
/// ```
#[derive(Clone)]
pub struct LoggingLayer {
    logger: SharedLogger,
}

impl fmt::Debug for LoggingLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingLayer").finish_non_exhaustive()
    }
}

impl LoggingLayer {
    /// Create a logging layer writing to `logger`.
    #[must_use]
    pub fn new(logger: SharedLogger) -> Self {
        Self { logger }
    }

    /// The logger sink.
    #[must_use]
    pub fn logger(&self) -> &SharedLogger {
        &self.logger
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            logger: self.logger.clone(),
        }
    }
}

/// Service that reports requests and their outcome.
#[derive(Clone)]
pub struct Logging<S> {
    inner: S,
    logger: SharedLogger,
}

impl<S: fmt::Debug> fmt::Debug for Logging<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logging")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<S> Logging<S> {
    /// Create a logging service wrapping the given service.
    pub fn new(inner: S, logger: SharedLogger) -> Self {
        Self { inner, logger }
    }
}

/// Headers as written to debug logs, sorted, with credentials masked.
fn redacted_headers(headers: &HashMap<String, String>) -> BTreeMap<&str, &str> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if name.eq_ignore_ascii_case("authorization") {
                "<redacted>"
            } else {
                value.as_str()
            };
            (name.as_str(), value)
        })
        .collect()
}

/// Level and message describing a finished exchange.
fn describe(request: &str, outcome: &Result<Response>, elapsed_ms: u64) -> (LogLevel, String) {
    match outcome {
        Ok(response) if response.status() < 400 => (
            LogLevel::Info,
            format!("{request} {} ({elapsed_ms} ms)", response.status()),
        ),
        Ok(response) => (
            LogLevel::Warn,
            format!("{request} {} ({elapsed_ms} ms)", response.status()),
        ),
        Err(err) => (
            LogLevel::Warn,
            format!("{request} failed: {err} ({elapsed_ms} ms)"),
        ),
    }
}

impl<S> Service<Request> for Logging<S>
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

    fn call(&mut self, request: Request) -> Self::Future {
        let method = request.method();
        let uri = request.uri().to_string();
        let span = span!(Level::INFO, "http_request", %method, %uri);

        // take the service that was driven to readiness
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let logger = self.logger.clone();

        Box::pin(
            async move {
                let start = Instant::now();
                tracing::debug!(headers = ?redacted_headers(request.headers()), "sending request");

                let result = inner.call(request).await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                let (level, message) = describe(&format!("{method} {uri}"), &result, elapsed_ms);
                logger.log(level, &message);
                result
            }
            .instrument(span),
        )
    }
}
