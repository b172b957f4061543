//! Core types and traits for the Shopping Feed SDK.
//!
//! This crate provides the foundational types used by `shoppingfeed`:
//! - [`Method`] - HTTP method enum
//! - [`Request`] and [`RequestBuilder`] - HTTP request types
//! - [`Response`] - HTTP response type
//! - [`Error`] and [`Result`] - Error handling
//! - [`HttpAdapter`] - The adapter contract used by resource APIs
//! - [`SendOptions`] - Per-call send options

mod body;
mod client;
mod error;
mod method;
pub mod prelude;
mod request;
mod response;

pub use body::{ContentType, from_json, to_json};
pub use client::{HttpAdapter, HttpAdapterExt, SendOptions};
pub use error::{Error, Result};
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::Response;

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
