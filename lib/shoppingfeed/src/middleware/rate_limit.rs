//! Rate-limit handling: retry throttled requests after the delay asked by the API.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::retry::{RetryHandler, outcome_header, outcome_status};
use crate::{Request, Response, Result, logger::SharedLogger};

/// Retries requests answered with `429 Too Many Requests`.
///
/// The wait before each retry is the `Retry-After` header when the server
/// sends one, either in seconds or as an HTTP date (a past date means no
/// wait). Otherwise it is an exponential backoff:
/// 1 s, 2 s, 4 s ... capped at [`RateLimitHandler::MAX_BACKOFF`].
///
/// # Example
///
/// ```ignore
/// use shoppingfeed::middleware::{RateLimitHandler, retry_layer};
///
/// let layer = retry_layer(RateLimitHandler::new(3));
/// ```
#[derive(Clone)]
pub struct RateLimitHandler {
    max_retries: u32,
    logger: Option<SharedLogger>,
}

impl fmt::Debug for RateLimitHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitHandler")
            .field("max_retries", &self.max_retries)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl Default for RateLimitHandler {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RETRIES)
    }
}

impl RateLimitHandler {
    /// Retries installed by the pipeline built from options.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// First backoff step when the server gives no `Retry-After`.
    pub const BASE_BACKOFF: Duration = Duration::from_secs(1);

    /// Upper bound of the computed backoff.
    pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

    /// Create a handler allowing `max_retries` retries.
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            logger: None,
        }
    }

    /// Report each scheduled retry to `logger`.
    #[must_use]
    pub fn with_logger(mut self, logger: Option<SharedLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Maximum number of retries.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn backoff(attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        Self::BASE_BACKOFF
            .saturating_mul(factor)
            .min(Self::MAX_BACKOFF)
    }
}

/// Parse a `Retry-After` value, delta-seconds or HTTP date, into a wait from `now`.
fn retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let wait = date.with_timezone(&Utc).signed_duration_since(now);
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}

impl RetryHandler for RateLimitHandler {
    fn decide(&self, attempt: u32, _request: &Request, outcome: &Result<Response>) -> bool {
        attempt <= self.max_retries && outcome_status(outcome) == Some(429)
    }

    fn delay(&self, attempt: u32, outcome: &Result<Response>) -> Duration {
        outcome_header(outcome, "Retry-After")
            .and_then(|value| retry_after(value, Utc::now()))
            .unwrap_or_else(|| Self::backoff(attempt))
    }

    fn on_retry(&self, attempt: u32, request: &Request, delay: Duration) {
        if let Some(logger) = &self.logger {
            logger.warn(&format!(
                "Rate limit reached on {} {}, retry #{attempt} in {} ms",
                request.method(),
                request.uri(),
                delay.as_millis()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use assert2::{check, let_assert};
    use bytes::Bytes;

    use super::*;
    use crate::{Error, LogLevel, MemoryLogger, Method};

    fn request() -> Request {
        Request::new(Method::Get, "https://api.shopping-feed.com/v1/me")
    }

    fn throttled(wait: Option<&str>) -> Result<Response> {
        let headers = wait
            .map(|value| HashMap::from([("retry-after".to_string(), value.to_string())]))
            .unwrap_or_default();
        Ok(Response::new(429, headers, Bytes::new()))
    }

    #[test]
    fn retries_429_up_to_max() {
        let handler = RateLimitHandler::new(3);
        for attempt in 1..=3 {
            check!(handler.decide(attempt, &request(), &throttled(None)));
        }
        check!(!handler.decide(4, &request(), &throttled(None)));
        check!(!handler.decide(10, &request(), &throttled(None)));
    }

    #[test]
    fn retries_429_http_error() {
        let handler = RateLimitHandler::default();
        let outcome = Err(Error::http(429, "Too Many Requests"));
        check!(handler.decide(1, &request(), &outcome));
    }

    #[test]
    fn ignores_other_outcomes() {
        let handler = RateLimitHandler::new(3);
        let server_error = Ok(Response::new(503, HashMap::new(), Bytes::new()));
        let success = Ok(Response::new(200, HashMap::new(), Bytes::new()));

        check!(!handler.decide(1, &request(), &server_error));
        check!(!handler.decide(1, &request(), &success));
        check!(!handler.decide(1, &request(), &Err(Error::Timeout)));
    }

    #[test]
    fn delay_prefers_retry_after() {
        let handler = RateLimitHandler::default();
        check!(handler.delay(1, &throttled(Some("7"))) == Duration::from_secs(7));
        check!(handler.delay(3, &throttled(Some(" 2 "))) == Duration::from_secs(2));
    }

    #[test]
    fn retry_after_accepts_http_date() {
        let_assert!(Ok(now) = DateTime::parse_from_rfc2822("Wed, 21 Oct 2015 07:27:30 GMT"));
        let now = now.with_timezone(&Utc);

        check!(retry_after("Wed, 21 Oct 2015 07:28:00 GMT", now) == Some(Duration::from_secs(30)));
        check!(retry_after("Wed, 21 Oct 2015 07:00:00 GMT", now) == Some(Duration::ZERO));
        check!(retry_after("next week", now) == None);
    }

    #[test]
    fn delay_waits_until_http_date() {
        let handler = RateLimitHandler::default();
        let target = Utc::now() + chrono::TimeDelta::hours(2);
        let value = target.format("%a, %d %b %Y %H:%M:%S GMT").to_string();

        let delay = handler.delay(1, &throttled(Some(&value)));
        check!(delay > Duration::from_secs(3600));
        check!(delay <= Duration::from_secs(2 * 3600));

        let past = handler.delay(1, &throttled(Some("Wed, 21 Oct 2015 07:28:00 GMT")));
        check!(past == Duration::ZERO);
    }

    #[test]
    fn delay_falls_back_to_backoff() {
        let handler = RateLimitHandler::default();
        check!(handler.delay(1, &throttled(None)) == Duration::from_secs(1));
        check!(handler.delay(2, &throttled(None)) == Duration::from_secs(2));
        check!(handler.delay(3, &throttled(Some("soon"))) == Duration::from_secs(4));
        check!(handler.delay(40, &throttled(None)) == RateLimitHandler::MAX_BACKOFF);
    }

    #[test]
    fn warns_on_scheduled_retry() {
        let recorder = Arc::new(MemoryLogger::new());
        let logger: SharedLogger = recorder.clone();
        let handler = RateLimitHandler::new(3).with_logger(Some(logger));

        handler.on_retry(2, &request(), Duration::from_millis(1500));

        check!(
            recorder.entries()
                == vec![(
                    LogLevel::Warn,
                    "Rate limit reached on GET https://api.shopping-feed.com/v1/me, retry #2 in 1500 ms"
                        .to_string()
                )]
        );
    }
}
