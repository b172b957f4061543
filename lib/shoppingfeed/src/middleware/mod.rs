//! Tower middleware implementing the adapter's request policies.
//!
//! Every policy is a plain tower [`Layer`], so it can be used on its own or
//! through the [`HandlerPipeline`](crate::HandlerPipeline) built from
//! [`ClientOptions`](crate::ClientOptions). Layers added first wrap outermost.
//!
//! # Available Layers
//!
//! - [`RetryLayer`] driven by a [`RetryHandler`]:
//!   - [`RateLimitHandler`] - retries `429` after `Retry-After` or a backoff
//!   - [`ServerErrorHandler`] - retries `5xx` and transient failures
//! - [`LoggingLayer`] - reports each physical attempt to a [`Logger`](crate::Logger)
//! - [`BearerAuthLayer`] - adds `Authorization: Bearer <token>`
//!
//! # Example
//!
//! ```ignore
//! use shoppingfeed::middleware::{
//!     BearerAuthLayer, RateLimitHandler, ServerErrorHandler, ServiceBuilder, retry_layer,
//! };
//!
//! let service = ServiceBuilder::new()
//!     .layer(retry_layer(RateLimitHandler::new(3)))
//!     .layer(retry_layer(ServerErrorHandler::new(2)))
//!     .layer(BearerAuthLayer::new("my-api-token"))
//!     .service(transport);
//! ```

mod bearer_auth;
mod logging;
mod rate_limit;
mod retry;
mod server_error;

pub use bearer_auth::{BearerAuth, BearerAuthLayer};
pub use logging::{Logging, LoggingLayer};
pub use rate_limit::RateLimitHandler;
pub use retry::{RetryHandler, RetryPolicy, retry_layer};
pub use server_error::ServerErrorHandler;

pub use tower::retry::{Retry, RetryLayer};
pub use tower::{Layer, ServiceBuilder};
