//! Relay and proxy doubles built on mockito.

use mockito::{Matcher, Mock, Server, ServerGuard};
use protect_core::{signing::SIGNATURE_HEADER, types::SEND_PRIVATE_TRANSACTION};
use serde_json::{json, Value};

/// A mock relay accepting `eth_sendPrivateTransaction`.
pub struct RelayMockBuilder {
    server: ServerGuard,
}

impl RelayMockBuilder {
    pub async fn new() -> Self {
        Self { server: Server::new_async().await }
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Accepts signed submissions of `raw_tx`, expecting exactly `hits` of them.
    pub async fn mock_accept(&mut self, raw_tx: &str, hits: usize) -> Mock {
        self.server
            .mock("POST", "/")
            .match_header(SIGNATURE_HEADER, Matcher::Regex("^0x[0-9a-f]{40}:0x[0-9a-f]{130}$".to_string()))
            .match_body(Matcher::PartialJson(json!({
                "method": SEND_PRIVATE_TRANSACTION,
                "params": [{ "tx": raw_tx }],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": null}).to_string())
            .expect(hits)
            .create_async()
            .await
    }

    /// Answers every submission with a JSON-RPC error.
    pub async fn mock_reject(&mut self, message: &str) -> Mock {
        self.server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": message}})
                    .to_string(),
            )
            .create_async()
            .await
    }

    /// Answers every submission with an HTTP error status.
    pub async fn mock_unavailable(&mut self, status: usize, hits: usize) -> Mock {
        self.server.mock("POST", "/").with_status(status).expect(hits).create_async().await
    }
}

/// A mock node answering ordinary JSON-RPC methods.
pub struct ProxyMockBuilder {
    server: ServerGuard,
}

impl ProxyMockBuilder {
    pub async fn new() -> Self {
        Self { server: Server::new_async().await }
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Answers `method` with `result`.
    pub async fn mock_method(&mut self, method: &str, result: &Value) -> Mock {
        self.server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "method": method })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": result}).to_string())
            .create_async()
            .await
    }

    /// Answers `method` with a raw status and body.
    pub async fn mock_raw(&mut self, method: &str, status: usize, body: &str) -> Mock {
        self.server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "method": method })))
            .with_status(status)
            .with_body(body)
            .create_async()
            .await
    }
}
