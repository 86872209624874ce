//! End-to-end request flows through a live gateway.
//!
//! Every test spawns a gateway on a loopback port with mockito standing in for
//! the relay and the proxied node, then talks to it over real HTTP.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::mock_infrastructure::{
    expected_hash, send_raw_transaction, test_config, ProxyMockBuilder, RelayMockBuilder,
    TestGateway, RAW_TX,
};
use chrono::{TimeDelta, TimeZone, Utc};
use protect_core::{
    clock::{MockClock, SharedClock},
    config::DEFAULT_DOCS_URL,
};
use reqwest::{redirect::Policy, Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;

const UNUSED_URL: &str = "http://127.0.0.1:9";

fn client() -> Client {
    Client::builder().redirect(Policy::none()).build().expect("test client builds")
}

async fn post_json(client: &Client, url: &str, body: &Value) -> (StatusCode, Value) {
    let response = client.post(url).json(body).send().await.expect("gateway reachable");
    let status = response.status();
    let json = response.json().await.expect("json body");
    (status, json)
}

#[tokio::test]
async fn test_duplicate_transaction_reaches_relay_once() {
    let mut relay = RelayMockBuilder::new().await;
    let mock = relay.mock_accept(RAW_TX, 1).await;
    let gateway = TestGateway::spawn(&test_config(UNUSED_URL, &relay.url()), None).await;
    let client = client();

    let (first_status, first) =
        post_json(&client, &gateway.url, &send_raw_transaction(RAW_TX, 1)).await;
    let (second_status, second) =
        post_json(&client, &gateway.url, &send_raw_transaction(RAW_TX, 2)).await;

    mock.assert_async().await;
    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first["result"], expected_hash(RAW_TX).as_str());
    assert_eq!(second["result"], expected_hash(RAW_TX).as_str());
    assert_eq!(first["id"], 1);
    assert_eq!(second["id"], 2);

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_duplicates_reach_relay_once() {
    let mut relay = RelayMockBuilder::new().await;
    let mock = relay.mock_accept(RAW_TX, 1).await;
    let gateway = TestGateway::spawn(&test_config(UNUSED_URL, &relay.url()), None).await;
    let client = client();

    let requests = (0..16u64).map(|id| {
        let client = client.clone();
        let url = gateway.url.clone();
        async move { post_json(&client, &url, &send_raw_transaction(RAW_TX, id)).await }
    });
    let responses = futures::future::join_all(requests).await;

    mock.assert_async().await;
    for (status, body) in responses {
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], expected_hash(RAW_TX).as_str());
    }

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_retransmission_allowed_after_window() {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let clock = Arc::new(MockClock::new(t0));
    let shared: SharedClock = clock.clone();

    let mut relay = RelayMockBuilder::new().await;
    let mock = relay.mock_accept(RAW_TX, 2).await;
    let gateway = TestGateway::spawn(&test_config(UNUSED_URL, &relay.url()), Some(shared)).await;
    let client = client();

    post_json(&client, &gateway.url, &send_raw_transaction(RAW_TX, 1)).await;

    clock.advance(TimeDelta::minutes(19));
    post_json(&client, &gateway.url, &send_raw_transaction(RAW_TX, 2)).await;
    assert!(gateway.dedup.was_forwarded(&expected_hash(RAW_TX)));

    clock.advance(TimeDelta::minutes(2));
    assert_eq!(gateway.dedup.sweep(), 1);
    assert!(!gateway.dedup.was_forwarded(&expected_hash(RAW_TX)));

    let (status, body) = post_json(&client, &gateway.url, &send_raw_transaction(RAW_TX, 3)).await;

    mock.assert_async().await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], expected_hash(RAW_TX).as_str());

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_relay_failure_allows_client_retry() {
    let mut relay = RelayMockBuilder::new().await;
    let mock = relay.mock_unavailable(503, 2).await;
    let gateway = TestGateway::spawn(&test_config(UNUSED_URL, &relay.url()), None).await;
    let client = client();

    let (first_status, first) =
        post_json(&client, &gateway.url, &send_raw_transaction(RAW_TX, 1)).await;
    let (second_status, _) =
        post_json(&client, &gateway.url, &send_raw_transaction(RAW_TX, 1)).await;

    mock.assert_async().await;
    assert_eq!(first_status, StatusCode::BAD_GATEWAY);
    assert_eq!(second_status, StatusCode::BAD_GATEWAY);
    assert_eq!(first["error"]["code"], -32603);
    assert!(gateway.dedup.is_empty());

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_relay_rejection_forwarded_to_client() {
    let mut relay = RelayMockBuilder::new().await;
    let _mock = relay.mock_reject("insufficient funds").await;
    let gateway = TestGateway::spawn(&test_config(UNUSED_URL, &relay.url()), None).await;

    let (status, body) =
        post_json(&client(), &gateway.url, &send_raw_transaction(RAW_TX, 77)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["message"], "insufficient funds");
    assert_eq!(body["id"], 77);

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_other_methods_proxied_verbatim() {
    let mut proxy = ProxyMockBuilder::new().await;
    let _chain_id = proxy.mock_method("eth_chainId", &json!("0x1")).await;
    let _limited = proxy
        .mock_raw("eth_getLogs", 429, r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32005,"message":"limit"}}"#)
        .await;
    let gateway = TestGateway::spawn(&test_config(&proxy.url(), UNUSED_URL), None).await;
    let client = client();

    let (status, body) = post_json(
        &client,
        &gateway.url,
        &json!({"jsonrpc": "2.0", "id": 1, "method": "eth_chainId", "params": []}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "0x1");

    let response = client
        .post(&gateway.url)
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "eth_getLogs", "params": [{}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        response.text().await.unwrap(),
        r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32005,"message":"limit"}}"#
    );

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_wallet_payload_without_jsonrpc_field_accepted() {
    let mut proxy = ProxyMockBuilder::new().await;
    let mock = proxy.mock_method("eth_chainId", &json!("0x1")).await;
    let gateway = TestGateway::spawn(&test_config(&proxy.url(), UNUSED_URL), None).await;

    let response = client()
        .post(&gateway.url)
        .header("content-type", "application/json")
        .body("\u{feff} {\"id\":1,\"method\":\"eth_chainId\",\"params\":null}\n")
        .send()
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(response.status(), StatusCode::OK);

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_blacklisted_origin_never_reaches_backends() {
    let mut relay = RelayMockBuilder::new().await;
    let relay_mock = relay.mock_accept(RAW_TX, 0).await;
    let gateway = TestGateway::spawn(&test_config(UNUSED_URL, &relay.url()), None).await;

    let response = client()
        .post(&gateway.url)
        .header("x-forwarded-for", "127.0.0.2")
        .json(&send_raw_transaction(RAW_TX, 1))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    relay_mock.assert_async().await;
    assert!(gateway.dedup.is_empty());

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_browser_routes_carry_cors() {
    let gateway = TestGateway::spawn(&test_config(UNUSED_URL, UNUSED_URL), None).await;
    let client = client();

    let redirect = client.get(&gateway.url).send().await.unwrap();
    assert_eq!(redirect.status(), StatusCode::FOUND);
    assert_eq!(redirect.headers()["location"], DEFAULT_DOCS_URL);
    assert_eq!(redirect.headers()["access-control-allow-origin"], "*");
    assert_eq!(redirect.headers()["access-control-allow-headers"], "Accept,Content-Type");

    let preflight = client.request(reqwest::Method::OPTIONS, &gateway.url).send().await.unwrap();
    assert_eq!(preflight.status(), StatusCode::OK);
    assert_eq!(preflight.headers()["access-control-allow-origin"], "*");
    assert!(preflight.bytes().await.unwrap().is_empty());

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_health_reports_start_and_current_time() {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let clock = Arc::new(MockClock::new(t0));
    let shared: SharedClock = clock.clone();
    let gateway = TestGateway::spawn(&test_config(UNUSED_URL, UNUSED_URL), Some(shared)).await;

    clock.advance(TimeDelta::seconds(5));
    let response = client().get(format!("{}/health", gateway.url)).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["startTime"], "2024-01-01T00:00:00Z");
    assert_eq!(body["time"], "2024-01-01T00:00:05Z");
    assert_eq!(body["version"], "test");

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_metrics_reflect_traffic() {
    let gateway = TestGateway::spawn(&test_config(UNUSED_URL, UNUSED_URL), None).await;
    let client = client();

    client.get(format!("{}/health", gateway.url)).send().await.unwrap();
    let metrics = client
        .get(format!("{}/metrics", gateway.url))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(metrics.contains("gateway_requests_total"));

    gateway.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let gateway = TestGateway::spawn(&test_config(UNUSED_URL, UNUSED_URL), None).await;
    let url = format!("{}/health", gateway.url);
    let client = client();

    assert_eq!(client.get(&url).send().await.unwrap().status(), StatusCode::OK);

    gateway.shutdown().await;

    let fresh = Client::new();
    assert!(fresh.get(&url).send().await.is_err());
}
