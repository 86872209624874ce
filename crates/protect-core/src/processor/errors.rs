use crate::{
    signing::SignerError,
    types::{codes, JsonRpcResponse},
};

use super::ProcessorResponse;

#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Relay unreachable: {0}")]
    RelayTransport(String),

    #[error("Relay returned HTTP {0}")]
    RelayHttp(u16),

    #[error("Relay response invalid: {0}")]
    RelayResponse(String),

    #[error("Proxy unreachable: {0}")]
    ProxyTransport(String),

    #[error("Signing error: {0}")]
    Signing(#[from] SignerError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProcessorError {
    /// HTTP status written for this error.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Parse(_) | Self::InvalidRequest(_) | Self::InvalidParams(_) => 400,
            Self::RelayTransport(_) |
            Self::RelayHttp(_) |
            Self::RelayResponse(_) |
            Self::ProxyTransport(_) => 502,
            Self::Signing(_) | Self::Internal(_) => 500,
        }
    }

    #[must_use]
    pub fn rpc_code(&self) -> i32 {
        match self {
            Self::Parse(_) => codes::PARSE_ERROR,
            Self::InvalidRequest(_) => codes::INVALID_REQUEST,
            Self::InvalidParams(_) => codes::INVALID_PARAMS,
            _ => codes::INTERNAL_ERROR,
        }
    }

    /// Converts into a JSON-RPC error response echoing `id`.
    #[must_use]
    pub fn into_response(self, id: serde_json::Value) -> ProcessorResponse {
        let status = self.status();
        let body = JsonRpcResponse::error(self.rpc_code(), self.to_string(), id);
        ProcessorResponse::json(status, &body)
    }
}
