//! Default transport: one physical HTTP exchange over hyper-util.

use std::collections::HashMap;
use std::io::Read;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower_service::Service;

use crate::{
    Error, Request, Response, Result, TransportConfig, connector::https_connector,
    service::ServiceFuture,
};

/// HTTP transport using hyper-util with connection pooling and TLS.
///
/// Executes exactly one exchange per call: no retry, no default header. The
/// adapter resolves request URIs before they reach the transport, so it only
/// accepts absolute URIs. Gzip-encoded bodies are decoded.
#[derive(Clone)]
pub struct HyperTransport {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: TransportConfig,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a transport with its own connection pool.
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        let connector = https_connector(&config);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector);

        Self { inner, config }
    }

    /// Transport settings.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Build a hyper request from an SDK request.
    fn build_hyper_request(request: Request) -> Result<http::Request<Full<Bytes>>> {
        let (method, uri, headers, body) = request.into_parts();

        let mut builder = http::Request::builder()
            .method(http::Method::from(method))
            .uri(uri.as_str());

        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let body = body.map_or_else(Full::default, Full::new);
        builder
            .body(body)
            .map_err(|e| Error::invalid_request(e.to_string()))
    }

    /// Extract response headers, lower-cased names.
    fn extract_headers(headers: &http::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    /// Run one exchange, headers and body, within the configured timeout.
    async fn execute(&self, request: Request) -> Result<Response> {
        let hyper_request = Self::build_hyper_request(request)?;

        tokio::time::timeout(self.config.timeout, self.exchange(hyper_request))
            .await
            .map_err(|_| Error::Timeout)?
    }

    async fn exchange(&self, request: http::Request<Full<Bytes>>) -> Result<Response> {
        let response = self
            .inner
            .request(request)
            .await
            .map_err(Self::map_hyper_error)?;

        let status = response.status().as_u16();
        let mut headers = Self::extract_headers(response.headers());

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| Error::connection(e.to_string()))?
            .to_bytes();

        let body = decode_body(&mut headers, body)?;

        Ok(Response::new(status, headers, body))
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = err.to_string();

        if err.is_connect() {
            return Error::connection(msg);
        }

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }
}

/// Decode a gzip body, dropping the headers describing the encoded form.
fn decode_body(headers: &mut HashMap<String, String>, body: Bytes) -> Result<Bytes> {
    let gzipped = headers
        .get("content-encoding")
        .is_some_and(|encoding| matches!(encoding.trim(), "gzip" | "x-gzip"));
    if !gzipped || body.is_empty() {
        return Ok(body);
    }

    let mut decoder = flate2::read::GzDecoder::new(body.as_ref());
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::invalid_response(format!("gzip decompression failed: {e}")))?;

    headers.remove("content-encoding");
    headers.remove("content-length");
    Ok(Bytes::from(decompressed))
}

impl Service<Request> for HyperTransport {
    type Response = Response;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let transport = self.clone();
        Box::pin(async move { transport.execute(request).await })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use assert2::{check, let_assert};
    use flate2::{Compression, write::GzEncoder};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::Method;

    #[test]
    fn transport_is_debug() {
        let transport = HyperTransport::new(TransportConfig::default());
        check!(format!("{transport:?}").contains("HyperTransport"));
    }

    #[test]
    fn hyper_request_keeps_headers_and_body() {
        let request = Request::builder(Method::Post, "https://api.shopping-feed.com/v1/auth")
            .header("Content-Type", "application/json")
            .body("{}")
            .build();

        let_assert!(Ok(hyper_request) = HyperTransport::build_hyper_request(request));
        check!(hyper_request.method() == http::Method::POST);
        check!(hyper_request.uri() == "https://api.shopping-feed.com/v1/auth");
        check!(hyper_request.headers()["content-type"] == "application/json");
    }

    #[tokio::test]
    async fn timeout_covers_body() {
        let_assert!(Ok(listener) = TcpListener::bind("127.0.0.1:0").await);
        let_assert!(Ok(address) = listener.local_addr());

        // Headers are sent at once, the body never completes
        let server = tokio::spawn(async move {
            let_assert!(Ok((mut socket, _)) = listener.accept().await);
            let mut buffer = [0_u8; 1024];
            let_assert!(Ok(_) = socket.read(&mut buffer).await);
            let head = "HTTP/1.1 200 OK\r\ncontent-length: 64\r\n\r\n{\"partial\":";
            let_assert!(Ok(()) = socket.write_all(head.as_bytes()).await);
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let config = TransportConfig {
            timeout: Duration::from_millis(200),
            ..TransportConfig::default()
        };
        let transport = HyperTransport::new(config);
        let request = Request::new(Method::Get, format!("http://{address}/v1/me"));

        let_assert!(Err(Error::Timeout) = transport.execute(request).await);
        server.abort();
    }

    #[test]
    fn hyper_request_rejects_invalid_uri() {
        let request = Request::new(Method::Get, "http://exa mple.com");
        let_assert!(Err(Error::InvalidRequest(_)) = HyperTransport::build_hyper_request(request));
    }

    #[test]
    fn decode_gzip_body() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        let_assert!(Ok(()) = encoder.write_all(br#"{"total":3}"#));
        let_assert!(Ok(compressed) = encoder.finish());

        let mut headers = HashMap::from([
            ("content-encoding".to_string(), "gzip".to_string()),
            ("content-length".to_string(), compressed.len().to_string()),
        ]);

        let_assert!(Ok(body) = decode_body(&mut headers, Bytes::from(compressed)));
        check!(body.as_ref() == br#"{"total":3}"#);
        check!(headers.is_empty());
    }

    #[test]
    fn decode_passes_identity_body() {
        let mut headers = HashMap::new();
        let_assert!(Ok(body) = decode_body(&mut headers, Bytes::from_static(b"plain")));
        check!(body.as_ref() == b"plain");
    }

    #[test]
    fn decode_reports_corrupt_gzip() {
        let mut headers = HashMap::from([("content-encoding".to_string(), "gzip".to_string())]);
        let_assert!(
            Err(Error::InvalidResponse(_)) =
                decode_body(&mut headers, Bytes::from_static(b"not gzip"))
        );
    }
}
