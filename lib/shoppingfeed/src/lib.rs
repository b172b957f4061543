//! Shopping Feed SDK: an HTTP adapter with request policies.
//!
//! The [`Adapter`] resolves requests against the API base URI, adds the
//! baseline headers and sends them through a [`HandlerPipeline`] of tower
//! middleware before they reach the transport:
//!
//! - rate-limit handling: `429` responses are retried after `Retry-After`
//! - server-error retry: `5xx` responses and transient failures are resent
//! - logging: every physical attempt is reported to a [`Logger`]
//! - token authentication, added with [`Adapter::with_token`]
//!
//! # Example
//!
//! ```ignore
//! use shoppingfeed::prelude::*;
//!
//! let options = ClientOptions::builder()
//!     .retry_on_server_error(2)
//!     .logger(TracingLogger::shared())
//!     .build();
//! let adapter = Adapter::new(options)?.with_token("my-api-token");
//!
//! let requests = vec![
//!     Request::new(Method::Get, "v1/me"),
//!     Request::new(Method::Get, "v1/store/1/order"),
//! ];
//! for outcome in adapter.batch_send(requests, &SendOptions::default()).await {
//!     println!("{}", outcome?.status());
//! }
//! ```
//!
//! The default transport is built on hyper-util and rustls, behind the
//! `hyper` feature (enabled by default). Without it, a transport must be
//! provided with [`AdapterBuilder::transport`].

mod adapter;
mod config;
#[cfg(feature = "hyper")]
mod connector;
mod logger;
pub mod middleware;
mod pipeline;
pub mod prelude;
mod service;
#[cfg(feature = "hyper")]
mod transport;

pub use adapter::{Adapter, AdapterBuilder, USER_AGENT};
pub use config::{ClientOptions, ClientOptionsBuilder, DEFAULT_BASE_URI, TransportConfig};
pub use logger::{LogLevel, Logger, MemoryLogger, SharedLogger, TracingLogger};
pub use pipeline::{HandlerPipeline, Middleware};
pub use service::{BoxedService, ServiceFuture, boxed};
#[cfg(feature = "hyper")]
pub use transport::HyperTransport;

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use shoppingfeed_core::{
    ContentType, Error, HttpAdapter, HttpAdapterExt, Method, Request, RequestBuilder, Response,
    Result, SendOptions, from_json, to_json,
};

// Re-export http types for status codes and headers
pub use shoppingfeed_core::{StatusCode, header};

pub use url;
