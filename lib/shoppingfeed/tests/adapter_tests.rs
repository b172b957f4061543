//! Adapter tests against a mock HTTP server, through the default transport.

#![cfg(feature = "hyper")]

use std::io::Write;
use std::time::Duration;

use flate2::{Compression, write::GzEncoder};
use serde_json::json;
use shoppingfeed::{
    Adapter, ClientOptions, Error, Method, Request, SendOptions, USER_AGENT, url::Url,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

fn options_for(server: &MockServer) -> ClientOptions {
    let base_uri = Url::parse(&format!("{}/", server.uri())).expect("base uri");
    ClientOptions::builder().base_uri(base_uri).build()
}

fn get(uri: &str) -> Request {
    Request::new(Method::Get, uri)
}

#[tokio::test]
async fn test_baseline_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("accept", "application/json"))
        .and(header("accept-encoding", "gzip"))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = Adapter::new(options_for(&server)).expect("adapter");
    let response = adapter
        .send(get("v1/me"), &SendOptions::default())
        .await
        .expect("response");

    let body: serde_json::Value = response.json().expect("json");
    assert_eq!(body["id"], 7);
}

#[tokio::test]
async fn test_with_token_trims_and_leaves_original_untouched() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let original = Adapter::new(options_for(&server)).expect("adapter");
    let authenticated = original.with_token("  abc  ");

    authenticated
        .send(get("v1/me"), &SendOptions::default())
        .await
        .expect("authenticated response");
    original
        .send(get("v1/me"), &SendOptions::default())
        .await
        .expect("anonymous response");

    let received = server.received_requests().await.expect("recorded requests");
    assert_eq!(received.len(), 2);
    assert_eq!(
        received[0].headers.get("authorization").map(|v| v.as_bytes()),
        Some(b"Bearer abc".as_slice())
    );
    assert!(received[1].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_configure_switches_base_uri() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    Mock::given(path("/v1/me"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&first)
        .await;
    Mock::given(path("/v1/me"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&second)
        .await;

    let mut adapter = Adapter::new(options_for(&first)).expect("adapter");
    let response = adapter
        .send(get("v1/me"), &SendOptions::default())
        .await
        .expect("first response");
    assert_eq!(response.status(), 200);

    adapter.configure(options_for(&second)).expect("configure");
    let response = adapter
        .send(get("v1/me"), &SendOptions::default())
        .await
        .expect("second response");
    assert_eq!(response.status(), 204);
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/store/1/order"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/store/1/order"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let options = ClientOptions {
        retry_on_server_error: 2,
        ..options_for(&server)
    };
    let adapter = Adapter::new(options).expect("adapter");
    let request = Request::builder(Method::Post, "v1/store/1/order")
        .json(&json!({"order": []}))
        .expect("json body")
        .build();

    let response = adapter
        .send(request, &SendOptions::default())
        .await
        .expect("response");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(path("/v1/store/1/order/42"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found"})))
        .expect(1)
        .mount(&server)
        .await;

    let options = ClientOptions {
        retry_on_server_error: 3,
        ..options_for(&server)
    };
    let adapter = Adapter::new(options).expect("adapter");

    let error = adapter
        .send(get("v1/store/1/order/42"), &SendOptions::default())
        .await
        .expect_err("404 must fail");

    assert_eq!(error.status(), Some(404));
    assert!(error.is_client_error());
    let detail: serde_json::Value = error
        .decode_body()
        .expect("body present")
        .expect("json body");
    assert_eq!(detail["detail"], "Not found");
}

#[tokio::test]
async fn test_rate_limit_gives_up_after_max_retries() {
    let server = MockServer::start().await;

    Mock::given(path("/v1/catalog"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(4)
        .mount(&server)
        .await;

    let adapter = Adapter::new(options_for(&server)).expect("adapter");
    let error = adapter
        .send(get("v1/catalog"), &SendOptions::default())
        .await
        .expect_err("429 must surface");

    assert!(error.is_rate_limited());
    assert_eq!(error.header("retry-after"), Some("0"));
}

#[tokio::test]
async fn test_batch_waits_for_every_request() {
    let server = MockServer::start().await;

    for (route, status) in [("/a", 200), ("/b", 500), ("/c", 201), ("/d", 404), ("/e", 200)] {
        Mock::given(path(route))
            .respond_with(ResponseTemplate::new(status).set_delay(Duration::from_millis(20)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let adapter = Adapter::new(options_for(&server)).expect("adapter");
    let requests = ["a", "b", "c", "d", "e"].into_iter().map(get).collect();
    let outcomes = adapter
        .batch_send(requests, &SendOptions::new().with_concurrency(2))
        .await;

    assert_eq!(outcomes.len(), 5);
    let statuses: Vec<Option<u16>> = outcomes
        .iter()
        .map(|outcome| match outcome {
            Ok(response) => Some(response.status()),
            Err(error) => error.status(),
        })
        .collect();
    assert_eq!(
        statuses,
        vec![Some(200), Some(500), Some(201), Some(404), Some(200)]
    );
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_err()).count(), 2);
}

#[tokio::test]
async fn test_call_options() {
    let server = MockServer::start().await;

    Mock::given(path("/v1/me"))
        .and(header("x-request-id", "42"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = Adapter::new(options_for(&server)).expect("adapter");
    let options = SendOptions::new()
        .with_header("X-Request-Id", "42")
        .without_http_errors();

    let response = adapter
        .send(get("v1/me"), &options)
        .await
        .expect("plain response");
    assert_eq!(response.status(), 503);
}

#[tokio::test]
async fn test_call_timeout() {
    let server = MockServer::start().await;

    Mock::given(path("/v1/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let adapter = Adapter::new(options_for(&server)).expect("adapter");
    let options = SendOptions::new().with_timeout(Duration::from_millis(100));

    let error = adapter
        .send(get("v1/slow"), &options)
        .await
        .expect_err("must time out");
    assert!(matches!(error, Error::Timeout));
}

#[tokio::test]
async fn test_gzip_body_is_decoded() {
    let server = MockServer::start().await;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(br#"{"total":3}"#)
        .expect("compress");
    let compressed = encoder.finish().expect("finish");

    Mock::given(path("/v1/store"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-encoding", "gzip")
                .set_body_raw(compressed, "application/json"),
        )
        .mount(&server)
        .await;

    let adapter = Adapter::new(options_for(&server)).expect("adapter");
    let response = adapter
        .send(get("v1/store"), &SendOptions::default())
        .await
        .expect("response");

    assert!(response.header("content-encoding").is_none());
    assert_eq!(response.text().expect("utf-8"), r#"{"total":3}"#);
}

#[tokio::test]
async fn test_connection_failure_is_transient() {
    let base_uri = Url::parse("http://127.0.0.1:1/").expect("base uri");
    let options = ClientOptions::builder()
        .base_uri(base_uri)
        .connect_timeout(Duration::from_millis(500))
        .build();
    let adapter = Adapter::new(options).expect("adapter");

    let error = adapter
        .send(get("v1/me"), &SendOptions::default())
        .await
        .expect_err("nothing listens there");
    assert!(error.is_transient());
}
