//! Server-error handling: resend requests that failed on the server side.

use super::retry::{RetryHandler, outcome_status};
use crate::{Request, Response, Result};

/// Retries `5xx` responses and transient transport failures immediately.
///
/// Connection failures and timeouts count as transient. A handler created
/// with `max_retries == 0` never retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerErrorHandler {
    max_retries: u32,
}

impl ServerErrorHandler {
    /// Create a handler allowing `max_retries` retries.
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Maximum number of retries.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

impl RetryHandler for ServerErrorHandler {
    fn decide(&self, attempt: u32, _request: &Request, outcome: &Result<Response>) -> bool {
        if attempt > self.max_retries {
            return false;
        }

        let server_side = outcome_status(outcome).is_some_and(|status| (500..600).contains(&status));
        let transient = outcome.as_ref().is_err_and(crate::Error::is_transient);
        server_side || transient
    }
}
