//! Default [`RequestProcessor`]: relay for transactions, proxy for everything else.

use super::{
    http_client::{build_client, sanitize_network_error},
    ProcessorError, ProcessorResponse, RequestContext, RequestProcessor,
};
use crate::{
    compat::CompatFixer,
    dedup::DedupCache,
    metrics::{DedupOutcome, GatewayMetrics},
    signing::{keccak256, SIGNATURE_HEADER},
    types::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, SEND_PRIVATE_TRANSACTION, SEND_RAW_TRANSACTION},
};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header::CONTENT_TYPE, Client};
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

/// What the relay said about a submission that reached it.
#[derive(Debug)]
enum RelayOutcome {
    Accepted,
    Rejected(JsonRpcError),
}

pub struct RelayProcessor {
    client: Client,
    dedup: Arc<DedupCache>,
    fixer: CompatFixer,
    metrics: Arc<GatewayMetrics>,
}

impl RelayProcessor {
    /// # Errors
    ///
    /// Returns [`ProcessorError::Internal`] if the HTTP client cannot be built.
    pub fn new(
        dedup: Arc<DedupCache>,
        metrics: Arc<GatewayMetrics>,
        request_timeout: Duration,
    ) -> Result<Self, ProcessorError> {
        Ok(Self::with_client(build_client(request_timeout)?, dedup, metrics))
    }

    #[must_use]
    pub fn with_client(client: Client, dedup: Arc<DedupCache>, metrics: Arc<GatewayMetrics>) -> Self {
        Self { client, dedup, fixer: CompatFixer::new(), metrics }
    }

    #[must_use]
    pub fn dedup(&self) -> &Arc<DedupCache> {
        &self.dedup
    }

    async fn handle(&self, ctx: &RequestContext) -> Result<ProcessorResponse, (ProcessorError, Value)> {
        let body = self.fixer.fix(ctx.body.clone());

        let value: Value =
            serde_json::from_slice(&body).map_err(|e| (ProcessorError::Parse(e.to_string()), Value::Null))?;

        if value.is_array() {
            return Err((
                ProcessorError::InvalidRequest("batch requests are not supported".to_string()),
                Value::Null,
            ));
        }

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = serde_json::from_value(value)
            .map_err(|e| (ProcessorError::InvalidRequest(e.to_string()), id.clone()))?;

        debug!(origin = %ctx.origin, method = %request.method, "processing request");

        if request.method == SEND_RAW_TRANSACTION {
            self.send_raw_transaction(ctx, &request).await.map_err(|e| (e, id))
        } else {
            self.proxy(ctx, body).await.map_err(|e| (e, id))
        }
    }

    async fn send_raw_transaction(
        &self,
        ctx: &RequestContext,
        request: &JsonRpcRequest,
    ) -> Result<ProcessorResponse, ProcessorError> {
        let raw_tx = request.param(0).and_then(Value::as_str).ok_or_else(|| {
            ProcessorError::InvalidParams("expected a hex-encoded raw transaction".to_string())
        })?;
        let tx_hash = transaction_hash(raw_tx)?;

        if !self.dedup.try_mark_forwarded(&tx_hash) {
            self.metrics.record_dedup_decision(DedupOutcome::Suppressed);
            info!(tx_hash = %tx_hash, origin = %ctx.origin, "duplicate transaction suppressed");
            return Ok(ProcessorResponse::json(
                200,
                &JsonRpcResponse::success(Value::String(tx_hash), request.id.clone()),
            ));
        }
        self.metrics.record_dedup_decision(DedupOutcome::Forwarded);

        match self.submit_to_relay(ctx, raw_tx).await {
            Ok(RelayOutcome::Accepted) => {
                self.metrics.record_relay_submission(true);
                info!(tx_hash = %tx_hash, origin = %ctx.origin, "transaction forwarded to relay");
                Ok(ProcessorResponse::json(
                    200,
                    &JsonRpcResponse::success(Value::String(tx_hash), request.id.clone()),
                ))
            }
            Ok(RelayOutcome::Rejected(error)) => {
                // The relay saw the transaction; the claim stays so retries are suppressed.
                self.metrics.record_relay_submission(false);
                warn!(tx_hash = %tx_hash, code = error.code, message = %error.message, "relay rejected transaction");
                Ok(ProcessorResponse::json(200, &JsonRpcResponse::from_error(error, request.id.clone())))
            }
            Err(e) => {
                self.dedup.forget(&tx_hash);
                self.metrics.record_relay_submission(false);
                warn!(tx_hash = %tx_hash, error = %e, "relay submission failed, claim released");
                Err(e)
            }
        }
    }

    async fn submit_to_relay(
        &self,
        ctx: &RequestContext,
        raw_tx: &str,
    ) -> Result<RelayOutcome, ProcessorError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": SEND_PRIVATE_TRANSACTION,
            "params": [{ "tx": raw_tx }],
        });
        let body = serde_json::to_vec(&payload).map_err(|e| ProcessorError::Internal(e.to_string()))?;
        let signature = ctx.signer.signature_header(&body)?;

        let response = self
            .client
            .post(&*ctx.relay_url)
            .header(CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await
            .map_err(|e| ProcessorError::RelayTransport(sanitize_network_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProcessorError::RelayHttp(status.as_u16()));
        }

        let parsed: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ProcessorError::RelayResponse(sanitize_network_error(&e)))?;

        Ok(match parsed.error {
            Some(error) => RelayOutcome::Rejected(error),
            None => RelayOutcome::Accepted,
        })
    }

    async fn proxy(&self, ctx: &RequestContext, body: Bytes) -> Result<ProcessorResponse, ProcessorError> {
        let response = self
            .client
            .post(&*ctx.proxy_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ProcessorError::ProxyTransport(sanitize_network_error(&e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProcessorError::ProxyTransport(sanitize_network_error(&e)))?;

        Ok(ProcessorResponse { status, body })
    }
}

#[async_trait]
impl RequestProcessor for RelayProcessor {
    async fn process(&self, ctx: RequestContext) -> ProcessorResponse {
        match self.handle(&ctx).await {
            Ok(response) => response,
            Err((error, id)) => {
                debug!(origin = %ctx.origin, error = %error, "request failed");
                error.into_response(id)
            }
        }
    }
}

/// `0x`-prefixed keccak256 of the decoded raw transaction bytes.
///
/// # Errors
///
/// Returns [`ProcessorError::InvalidParams`] for empty or non-hex input.
pub fn transaction_hash(raw_tx: &str) -> Result<String, ProcessorError> {
    let stripped = raw_tx.strip_prefix("0x").unwrap_or(raw_tx);
    let bytes = hex::decode(stripped)
        .map_err(|e| ProcessorError::InvalidParams(format!("raw transaction is not hex: {e}")))?;
    if bytes.is_empty() {
        return Err(ProcessorError::InvalidParams("raw transaction is empty".to_string()));
    }
    Ok(format!("0x{}", hex::encode(keccak256(&bytes))))
}
