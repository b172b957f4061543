//! Retry plumbing shared by the rate-limit and server-error handlers.
//!
//! A [`RetryHandler`] only answers two questions for a finished attempt:
//! should it be retried, and how long to wait first. [`RetryPolicy`] plugs a
//! handler into `tower::retry`, keeping the per-request attempt counter.

use std::future::{self, Future};
use std::pin::Pin;
use std::time::Duration;

use tower::retry::{Policy, RetryLayer};

use crate::{Error, Request, Response, Result};

/// Decision and delay functions of a retry policy.
///
/// `attempt` is the 1-based number of physical attempts already made for the
/// request, so the first failure is evaluated with `attempt == 1`.
pub trait RetryHandler: Clone + Send + Sync + 'static {
    /// Returns `true` if the request should be sent again.
    fn decide(&self, attempt: u32, request: &Request, outcome: &Result<Response>) -> bool;

    /// Wait before the next attempt. Defaults to an immediate retry.
    fn delay(&self, _attempt: u32, _outcome: &Result<Response>) -> Duration {
        Duration::ZERO
    }

    /// Called once a retry is scheduled, before waiting.
    fn on_retry(&self, _attempt: u32, _request: &Request, _delay: Duration) {}
}

/// `tower` retry policy driven by a [`RetryHandler`].
///
/// # Example
///
/// ```ignore
/// use shoppingfeed::middleware::{RetryPolicy, ServerErrorHandler};
/// use tower::retry::RetryLayer;
///
/// let layer = RetryLayer::new(RetryPolicy::new(ServerErrorHandler::new(2)));
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy<H> {
    handler: H,
    attempts: u32,
}

impl<H> RetryPolicy<H> {
    /// Create a policy that has not seen any attempt yet.
    #[must_use]
    pub const fn new(handler: H) -> Self {
        Self {
            handler,
            attempts: 0,
        }
    }

    /// The wrapped handler.
    #[must_use]
    pub const fn handler(&self) -> &H {
        &self.handler
    }
}

/// Wrap a handler into a ready-to-use `tower` retry layer.
#[must_use]
pub fn retry_layer<H: RetryHandler>(handler: H) -> RetryLayer<RetryPolicy<H>> {
    RetryLayer::new(RetryPolicy::new(handler))
}

impl<H: RetryHandler> Policy<Request, Response, Error> for RetryPolicy<H> {
    type Future = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn retry(
        &mut self,
        req: &mut Request,
        result: &mut Result<Response>,
    ) -> Option<Self::Future> {
        // tower clones the policy per request, so this counts attempts of one request
        self.attempts = self.attempts.saturating_add(1);

        if !self.handler.decide(self.attempts, req, result) {
            return None;
        }

        let delay = self.handler.delay(self.attempts, result);
        self.handler.on_retry(self.attempts, req, delay);
        tracing::debug!(
            attempt = self.attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            uri = req.uri(),
            "retrying request"
        );

        if delay.is_zero() {
            Some(Box::pin(future::ready(())))
        } else {
            Some(Box::pin(tokio::time::sleep(delay)))
        }
    }

    fn clone_request(&mut self, req: &Request) -> Option<Request> {
        Some(req.clone())
    }
}

/// HTTP status of an outcome, from the response or from an HTTP error.
pub(crate) fn outcome_status(outcome: &Result<Response>) -> Option<u16> {
    match outcome {
        Ok(response) => Some(response.status()),
        Err(error) => error.status(),
    }
}

/// Header of an outcome, from the response or from an HTTP error.
pub(crate) fn outcome_header<'a>(outcome: &'a Result<Response>, name: &str) -> Option<&'a str> {
    match outcome {
        Ok(response) => response.header(name),
        Err(error) => error.header(name),
    }
}
