//! HTTP request building.
//!
//! Use [`Request::builder`] to construct requests with headers and bodies.
//! The URI may be absolute or relative to the adapter base URI, it is resolved
//! when the request is sent.
//!
//! # Example
//!
//! ```
//! use shoppingfeed_core::{Method, Request};
//!
//! let request = Request::builder(Method::Get, "v1/store/42/order")
//!     .header("Accept", "application/json")
//!     .build();
//! assert_eq!(request.uri(), "v1/store/42/order");
//! ```

use std::collections::HashMap;

use bytes::Bytes;
use url::Url;

use crate::Method;

/// An HTTP request with method, URI, headers, and optional body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    uri: String,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
}

impl Request {
    /// Creates a request without headers nor body.
    #[must_use]
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        RequestBuilder::new(method, uri).build()
    }

    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, uri: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, uri)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URI, as given or as resolved by [`Request::resolve`].
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns `true` if a header with this name is present (any case).
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// Set a header, replacing any existing value regardless of name case.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    /// Set a header only when the request does not carry it yet.
    pub fn set_default_header(&mut self, name: &str, value: &str) {
        if !self.has_header(name) {
            self.headers.insert(name.to_string(), value.to_string());
        }
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Resolve the URI against `base` (RFC 3986 reference resolution).
    ///
    /// Absolute URIs are kept as they are.
    pub fn resolve(&mut self, base: &Url) -> crate::Result<()> {
        self.uri = base.join(&self.uri)?.into();
        Ok(())
    }

    /// Consume into (method, uri, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, String, HashMap<String, String>, Option<Bytes>) {
        (self.method, self.uri, self.headers, self.body)
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    uri: String,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
}

impl RequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Sets a header, replacing any header with the same name in any case.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
        self
    }

    /// Sets multiple headers.
    #[must_use]
    pub fn headers(self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        headers
            .into_iter()
            .fold(self, |builder, (name, value)| builder.header(name, value))
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a JSON body and the matching `Content-Type`.
    pub fn json<T: serde::Serialize>(self, value: &T) -> crate::Result<Self> {
        let body = crate::to_json(value)?;
        Ok(self
            .header("Content-Type", crate::ContentType::Json.as_str())
            .body(body))
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method,
            uri: self.uri,
            headers: self.headers,
            body: self.body,
        }
    }
}
