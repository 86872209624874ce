//! JSON-RPC 2.0 wire types.
//!
//! `jsonrpc` uses `Cow<'static, str>` so responses built with
//! [`JSONRPC_VERSION_COW`] do not allocate. `id` is kept as an opaque
//! [`serde_json::Value`] and echoed back untouched.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub const JSONRPC_VERSION: &str = "2.0";

pub const JSONRPC_VERSION_COW: Cow<'static, str> = Cow::Borrowed(JSONRPC_VERSION);

/// Method whose submissions are deduplicated and sent to the relay.
pub const SEND_RAW_TRANSACTION: &str = "eth_sendRawTransaction";

/// Relay method used to submit a private transaction.
pub const SEND_PRIVATE_TRANSACTION: &str = "eth_sendPrivateTransaction";

/// Standard and gateway-specific JSON-RPC error codes.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Generic server error; used for admission rejections.
    pub const SERVER_ERROR: i32 = -32000;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: Cow<'static, str>,
    pub method: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
    #[serde(default)]
    pub id: serde_json::Value,
}

impl JsonRpcRequest {
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        params: Option<serde_json::Value>,
        id: serde_json::Value,
    ) -> Self {
        Self { jsonrpc: JSONRPC_VERSION_COW, method: method.into(), params, id }
    }

    /// Returns positional parameter `index`, if params is an array.
    #[must_use]
    pub fn param(&self, index: usize) -> Option<&serde_json::Value> {
        self.params.as_ref().and_then(|p| p.as_array()).and_then(|a| a.get(index))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// A response carries either `result` or `error`, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: serde_json::Value,
}

impl JsonRpcResponse {
    #[must_use]
    pub fn success(result: serde_json::Value, id: serde_json::Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION_COW, result: Some(result), error: None, id }
    }

    #[must_use]
    pub fn error(code: i32, message: impl Into<String>, id: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION_COW,
            result: None,
            error: Some(JsonRpcError { code, message: message.into(), data: None }),
            id,
        }
    }

    #[must_use]
    pub fn from_error(error: JsonRpcError, id: serde_json::Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION_COW, result: None, error: Some(error), id }
    }

    /// Serializes to bytes. Falls back to a fixed internal-error body, which
    /// cannot fail, if serialization of `self` does.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_else(|_| {
            br#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"internal error"},"id":null}"#
                .to_vec()
        })
    }
}
