//! HTTP method types.

use std::str::FromStr;

use derive_more::Display;

/// HTTP request method accepted by the Shopping Feed API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// GET method.
    #[display("GET")]
    Get,
    /// POST method.
    #[display("POST")]
    Post,
    /// PUT method.
    #[display("PUT")]
    Put,
    /// PATCH method.
    #[display("PATCH")]
    Patch,
    /// DELETE method.
    #[display("DELETE")]
    Delete,
    /// HEAD method.
    #[display("HEAD")]
    Head,
    /// OPTIONS method.
    #[display("OPTIONS")]
    Options,
}

impl FromStr for Method {
    type Err = crate::Error;

    /// Parse a method name, ignoring ASCII case.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            other => Err(crate::Error::invalid_request(format!(
                "unsupported HTTP method: {other}"
            ))),
        }
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Patch => Self::PATCH,
            Method::Delete => Self::DELETE,
            Method::Head => Self::HEAD,
            Method::Options => Self::OPTIONS,
        }
    }
}
