//! Body serialization utilities.

use bytes::Bytes;

use crate::Result;

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// HAL+JSON content type returned by the API (`application/hal+json`).
    HalJson,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::HalJson => "application/hal+json",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialize a value to JSON bytes.
///
/// # Example
///
/// ```
/// use shoppingfeed_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Ship { carrier: String }
///
/// let bytes = to_json(&Ship { carrier: "ups".to_string() }).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"carrier":"ups"}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes, reporting the path of the failing field.
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let deserializer = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(deserializer).map_err(|err| {
        let path = err.path().to_string();
        crate::Error::json_deserialization(path, err.into_inner().to_string())
    })
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Order {
        reference: String,
        items: Vec<Item>,
    }

    #[derive(Debug, serde::Deserialize)]
    #[allow(dead_code)]
    struct Item {
        quantity: u32,
    }

    #[test]
    fn content_type_display() {
        check!(ContentType::Json.to_string() == "application/json");
        check!(ContentType::HalJson.to_string() == "application/hal+json");
    }

    #[test]
    fn from_json_reports_path() {
        let_assert!(
            Err(err) = from_json::<Order>(br#"{"reference":"A","items":[{"quantity":"two"}]}"#)
        );
        let_assert!(crate::Error::JsonDeserialization { path, .. } = err);
        check!(path == "items[0].quantity");
    }
}
