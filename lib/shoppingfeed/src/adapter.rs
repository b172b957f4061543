//! The adapter: configuration, pipeline and transport behind one handle.

use std::fmt;

use bytes::Bytes;
use futures_util::{StreamExt, stream};
use tower_service::Service;

use crate::{
    ClientOptions, Error, HandlerPipeline, HttpAdapter, Method, Middleware, Request, Response,
    Result, SendOptions, TransportConfig,
    middleware::BearerAuthLayer,
    service::{BoxedService, SyncService, boxed},
};

/// `User-Agent` sent with every request.
pub const USER_AGENT: &str = concat!("SF-SDK-Rust/", env!("CARGO_PKG_VERSION"));

/// Headers set on every request unless already present.
const BASELINE_HEADERS: [(&str, &str); 3] = [
    ("Accept", "application/json"),
    ("User-Agent", USER_AGENT),
    ("Accept-Encoding", "gzip"),
];

/// Raw transport, before any middleware.
#[derive(Clone)]
struct Transport {
    service: SyncService,
    injected: bool,
}

impl Transport {
    fn injected(service: BoxedService) -> Self {
        Self {
            service: SyncService::new(service),
            injected: true,
        }
    }

    fn default_for(config: &TransportConfig) -> Result<Self> {
        Ok(Self {
            service: SyncService::new(default_transport(config)?),
            injected: false,
        })
    }
}

#[cfg(feature = "hyper")]
#[allow(clippy::unnecessary_wraps)]
fn default_transport(config: &TransportConfig) -> Result<BoxedService> {
    Ok(boxed(crate::HyperTransport::new(config.clone())))
}

#[cfg(not(feature = "hyper"))]
fn default_transport(_config: &TransportConfig) -> Result<BoxedService> {
    Err(Error::missing_dependency(
        "no HTTP transport available: enable the `hyper` feature of `shoppingfeed` \
         or provide one with `AdapterBuilder::transport`",
    ))
}

/// Sends Shopping Feed API requests under the configured policies.
///
/// Every request has its URI resolved against [`ClientOptions::base_uri`],
/// receives the baseline headers (`Accept: application/json`, `User-Agent`,
/// `Accept-Encoding: gzip`) when missing, then goes through the
/// [`HandlerPipeline`] down to the transport.
///
/// Cloning is cheap: clones share the transport and its connection pool.
///
/// # Example
///
/// ```ignore
/// use shoppingfeed::{Adapter, ClientOptions, Method, SendOptions};
///
/// let options = ClientOptions::builder().retry_on_server_error(2).build();
/// let adapter = Adapter::new(options)?.with_token("my-api-token");
///
/// let request = Adapter::create_request(Method::Get, "v1/me", [], None);
/// let response = adapter.send(request, &SendOptions::default()).await?;
/// ```
#[derive(Clone)]
pub struct Adapter {
    options: ClientOptions,
    pipeline: HandlerPipeline,
    transport: Transport,
    client: SyncService,
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("options", &self.options)
            .field("pipeline", &self.pipeline)
            .field("injected_transport", &self.transport.injected)
            .finish_non_exhaustive()
    }
}

impl Adapter {
    /// Create an adapter with the default transport and the pipeline built
    /// from `options`.
    ///
    /// Fails with [`Error::MissingDependency`] when the crate is built without
    /// its default transport.
    pub fn new(options: ClientOptions) -> Result<Self> {
        Self::builder().options(options).build()
    }

    /// Create a new adapter builder.
    #[must_use]
    pub fn builder() -> AdapterBuilder {
        AdapterBuilder::default()
    }

    fn assemble(options: ClientOptions, pipeline: HandlerPipeline, transport: Transport) -> Self {
        let client = SyncService::new(pipeline.layer(transport.service.service()));
        Self {
            options,
            pipeline,
            transport,
            client,
        }
    }

    /// Replace the options and rebuild the pipeline from them.
    ///
    /// An injected transport is kept; the default one is rebuilt from the new
    /// transport settings. Middleware added outside the options (such as a
    /// token) is dropped.
    pub fn configure(&mut self, options: ClientOptions) -> Result<&mut Self> {
        let transport = if self.transport.injected {
            self.transport.clone()
        } else {
            Transport::default_for(&options.transport)?
        };
        let pipeline = HandlerPipeline::from_options(&options);
        tracing::debug!(?options, ?pipeline, "adapter reconfigured");

        *self = Self::assemble(options, pipeline, transport);
        Ok(self)
    }

    /// Build a request. Nothing is sent.
    pub fn create_request(
        method: Method,
        uri: impl Into<String>,
        headers: impl IntoIterator<Item = (String, String)>,
        body: Option<Bytes>,
    ) -> Request {
        let builder = Request::builder(method, uri).headers(headers);
        match body {
            Some(body) => builder.body(body),
            None => builder,
        }
        .build()
    }

    /// Send one request.
    ///
    /// Resolves once the pipeline settled, retries included. When
    /// `options.http_errors` is set, a final status of 400 or above is
    /// returned as [`Error::Http`].
    pub async fn send(&self, request: Request, options: &SendOptions) -> Result<Response> {
        let request = self.prepare(request, options)?;
        let exchange = self.client.call(request);

        let response = match options.timeout {
            Some(timeout) => tokio::time::timeout(timeout, exchange)
                .await
                .map_err(|_| Error::Timeout)??,
            None => exchange.await?,
        };

        if options.http_errors {
            response.error_for_status()
        } else {
            Ok(response)
        }
    }

    /// Send requests with at most `options.concurrency` in flight.
    ///
    /// Waits for every request, retries included. Outcomes are returned in
    /// the order of `requests`, whatever the completion order.
    pub async fn batch_send(
        &self,
        requests: Vec<Request>,
        options: &SendOptions,
    ) -> Vec<Result<Response>> {
        let concurrency = options.concurrency.max(1);
        tracing::debug!(count = requests.len(), concurrency, "sending batch");

        let sends: Vec<_> = requests
            .into_iter()
            .map(|request| self.send(request, options))
            .collect();

        stream::iter(sends).buffered(concurrency).collect().await
    }

    /// Derive an adapter authenticating every request with `token`.
    ///
    /// The token is trimmed. `self` is left untouched; both adapters share
    /// the transport.
    #[must_use]
    pub fn with_token(&self, token: &str) -> Self {
        let pipeline = self
            .pipeline
            .clone()
            .with(Middleware::TokenAuth(BearerAuthLayer::new(token)));
        Self::assemble(self.options.clone(), pipeline, self.transport.clone())
    }

    /// Current options.
    #[must_use]
    pub const fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Current pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &HandlerPipeline {
        &self.pipeline
    }

    fn prepare(&self, mut request: Request, options: &SendOptions) -> Result<Request> {
        request.resolve(&self.options.base_uri)?;

        for (name, value) in &options.headers {
            request.set_header(name.as_str(), value.as_str());
        }
        for (name, value) in BASELINE_HEADERS {
            request.set_default_header(name, value);
        }

        Ok(request)
    }
}

impl HttpAdapter for Adapter {
    async fn send(&self, request: Request, options: &SendOptions) -> Result<Response> {
        Self::send(self, request, options).await
    }

    async fn batch_send(
        &self,
        requests: Vec<Request>,
        options: &SendOptions,
    ) -> Vec<Result<Response>> {
        Self::batch_send(self, requests, options).await
    }

    fn with_token(&self, token: &str) -> Result<Self> {
        Ok(Self::with_token(self, token))
    }
}

/// Builder for [`Adapter`].
///
/// Options default to [`ClientOptions::default`], the pipeline to the one
/// built from the options, the transport to the crate's default transport.
#[derive(Default)]
pub struct AdapterBuilder {
    options: Option<ClientOptions>,
    pipeline: Option<HandlerPipeline>,
    transport: Option<BoxedService>,
}

impl fmt::Debug for AdapterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterBuilder")
            .field("options", &self.options)
            .field("pipeline", &self.pipeline)
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

impl AdapterBuilder {
    /// Set the options.
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Use this pipeline instead of the one built from the options.
    #[must_use]
    pub fn pipeline(mut self, pipeline: HandlerPipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Use this transport instead of the default one.
    ///
    /// The transport performs exactly one exchange per call, with an absolute
    /// URI.
    #[must_use]
    pub fn transport<S>(mut self, transport: S) -> Self
    where
        S: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
        S::Future: Send + 'static,
    {
        self.transport = Some(boxed(transport));
        self
    }

    /// Build the adapter.
    pub fn build(self) -> Result<Adapter> {
        let options = self.options.unwrap_or_default();
        let pipeline = self
            .pipeline
            .unwrap_or_else(|| HandlerPipeline::from_options(&options));
        let transport = match self.transport {
            Some(service) => Transport::injected(service),
            None => Transport::default_for(&options.transport)?,
        };

        Ok(Adapter::assemble(options, pipeline, transport))
    }
}
