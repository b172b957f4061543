//! Prelude module for convenient imports.
//!
//! ```ignore
//! use shoppingfeed::prelude::*;
//! ```

pub use crate::{
    Adapter, ClientOptions, Error, HandlerPipeline, HttpAdapter, HttpAdapterExt, LogLevel, Logger,
    Method, Middleware, Request, RequestBuilder, Response, Result, SendOptions, StatusCode,
    TracingLogger,
};
