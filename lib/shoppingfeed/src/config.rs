//! Client configuration types.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::logger::SharedLogger;

/// Base URI of the Shopping Feed API.
pub const DEFAULT_BASE_URI: &str = "https://api.shopping-feed.com/";

/// Connection-level settings of the default transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Timeout of one physical exchange.
    pub timeout: Duration,
    /// Connection timeout duration.
    pub connect_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_idle_per_host: usize,
    /// Idle connection timeout.
    pub pool_idle_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

/// Adapter configuration: where to send requests and which policies apply.
///
/// Relative request URIs are resolved against `base_uri` following RFC 3986,
/// so a base with a path prefix must end with `/` to keep it.
#[derive(Clone)]
pub struct ClientOptions {
    /// Base URI requests are resolved against.
    pub base_uri: Url,
    /// Sink receiving exchange logs and rate-limit warnings.
    pub logger: Option<SharedLogger>,
    /// Retry throttled (429) requests after the delay asked by the server.
    pub handle_rate_limit: bool,
    /// Number of retries on 5xx responses and transient transport failures.
    pub retry_on_server_error: u32,
    /// Settings of the default transport.
    pub transport: TransportConfig,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("base_uri", &self.base_uri.as_str())
            .field("logger", &self.logger.is_some())
            .field("handle_rate_limit", &self.handle_rate_limit)
            .field("retry_on_server_error", &self.retry_on_server_error)
            .field("transport", &self.transport)
            .finish()
    }
}

impl Default for ClientOptions {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self {
            base_uri: Url::parse(DEFAULT_BASE_URI).expect("default base URI is valid"),
            logger: None,
            handle_rate_limit: true,
            retry_on_server_error: 0,
            transport: TransportConfig::default(),
        }
    }
}

impl ClientOptions {
    /// Create a new options builder.
    #[must_use]
    pub fn builder() -> ClientOptionsBuilder {
        ClientOptionsBuilder::default()
    }
}

/// Builder for [`ClientOptions`].
#[derive(Default)]
pub struct ClientOptionsBuilder {
    base_uri: Option<Url>,
    logger: Option<SharedLogger>,
    handle_rate_limit: Option<bool>,
    retry_on_server_error: Option<u32>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
}

impl fmt::Debug for ClientOptionsBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptionsBuilder")
            .field("base_uri", &self.base_uri.as_ref().map(Url::as_str))
            .field("logger", &self.logger.is_some())
            .field("handle_rate_limit", &self.handle_rate_limit)
            .field("retry_on_server_error", &self.retry_on_server_error)
            .finish_non_exhaustive()
    }
}

impl ClientOptionsBuilder {
    /// Set the base URI.
    #[must_use]
    pub fn base_uri(mut self, base_uri: Url) -> Self {
        self.base_uri = Some(base_uri);
        self
    }

    /// Set the logger sink.
    #[must_use]
    pub fn logger(mut self, logger: SharedLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Enable or disable rate-limit handling.
    #[must_use]
    pub const fn handle_rate_limit(mut self, enabled: bool) -> Self {
        self.handle_rate_limit = Some(enabled);
        self
    }

    /// Set the number of retries on server errors (0 disables them).
    #[must_use]
    pub const fn retry_on_server_error(mut self, count: u32) -> Self {
        self.retry_on_server_error = Some(count);
        self
    }

    /// Set the timeout of one physical exchange.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Build the options.
    #[must_use]
    pub fn build(self) -> ClientOptions {
        let defaults = ClientOptions::default();
        let transport = TransportConfig {
            timeout: self.timeout.unwrap_or(defaults.transport.timeout),
            connect_timeout: self
                .connect_timeout
                .unwrap_or(defaults.transport.connect_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.transport.pool_idle_per_host),
            pool_idle_timeout: self
                .pool_idle_timeout
                .unwrap_or(defaults.transport.pool_idle_timeout),
        };

        ClientOptions {
            base_uri: self.base_uri.unwrap_or(defaults.base_uri),
            logger: self.logger,
            handle_rate_limit: self
                .handle_rate_limit
                .unwrap_or(defaults.handle_rate_limit),
            retry_on_server_error: self
                .retry_on_server_error
                .unwrap_or(defaults.retry_on_server_error),
            transport,
        }
    }
}
