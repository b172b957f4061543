//! Prelude module for convenient imports.
//!
//! ```ignore
//! use shoppingfeed_core::prelude::*;
//! ```

pub use crate::{
    ContentType, Error, HttpAdapter, HttpAdapterExt, Method, Request, RequestBuilder, Response,
    Result, SendOptions, from_json, to_json,
};
