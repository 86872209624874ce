//! Request processing behind the dispatcher.
//!
//! The dispatcher hands every admitted `POST /` to a [`RequestProcessor`] and
//! writes back whatever [`ProcessorResponse`] it returns, unmodified. The
//! processor owns JSON-RPC parsing, deduplication of transaction submissions,
//! relay signing and proxying.
//!
//! ```text
//!  POST /  ──► RequestContext ──► RequestProcessor::process ──► ProcessorResponse
//!                                       │
//!                     ┌─────────────────┴──────────────────┐
//!                     ▼                                    ▼
//!          eth_sendRawTransaction                    any other method
//!                     │                                    │
//!          DedupCache::try_mark_forwarded             proxy URL (verbatim)
//!             │                 │
//!          claimed          duplicate ──► tx hash, relay untouched
//!             │
//!          relay URL (signed)
//! ```

pub mod errors;
pub mod http_client;
pub mod relay;

pub use errors::ProcessorError;
pub use relay::RelayProcessor;

use crate::{signing::RelaySigner, types::JsonRpcResponse};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Everything a processor needs to handle one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Client address as resolved by the dispatcher.
    pub origin: String,
    /// Raw request body, before compatibility fixing.
    pub body: Bytes,
    pub proxy_url: Arc<str>,
    pub relay_url: Arc<str>,
    pub signer: Arc<RelaySigner>,
}

/// Status and body written back to the client verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorResponse {
    pub status: u16,
    pub body: Bytes,
}

impl ProcessorResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self { status, body: body.into() }
    }

    #[must_use]
    pub fn json(status: u16, response: &JsonRpcResponse) -> Self {
        Self::new(status, response.to_bytes())
    }
}

#[async_trait]
pub trait RequestProcessor: Send + Sync {
    async fn process(&self, ctx: RequestContext) -> ProcessorResponse;
}
