use crate::{gateway::GatewayState, middleware::ClientOrigin};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use protect_core::{
    processor::ProcessorResponse,
    types::{codes, JsonRpcResponse},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

const JSON_CONTENT_TYPE: &str = "application/json";

fn json_response(status: StatusCode, body: impl Into<Bytes>) -> Response {
    (status, [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body.into()).into_response()
}

/// `GET /`: sends browsers to the documentation.
#[allow(clippy::unused_async)]
pub async fn handle_redirect(State(state): State<Arc<GatewayState>>) -> Response {
    state.metrics.record_request("redirect", StatusCode::FOUND.as_u16());
    (StatusCode::FOUND, [(header::LOCATION, state.docs_url.to_string())]).into_response()
}

/// `OPTIONS /`: CORS preflight. The CORS layers supply the headers.
#[allow(clippy::unused_async)]
pub async fn handle_preflight(State(state): State<Arc<GatewayState>>) -> StatusCode {
    state.metrics.record_request("preflight", StatusCode::OK.as_u16());
    StatusCode::OK
}

/// `POST /`: admission check, then delegation to the request processor.
///
/// The processor's status and body are written back unmodified. Blacklisted
/// origins get 403 and never reach the processor; a processor that outlives
/// the configured timeout yields 504.
pub async fn handle_rpc(
    State(state): State<Arc<GatewayState>>,
    origin: ClientOrigin,
    body: Bytes,
) -> Response {
    if state.blacklist.is_blacklisted(origin.as_str()) {
        state.metrics.record_admission_rejection();
        state.metrics.record_request("rpc", StatusCode::FORBIDDEN.as_u16());
        warn!(origin = %origin, "rejected request from blacklisted origin");

        let body = JsonRpcResponse::error(codes::SERVER_ERROR, "origin not allowed", Value::Null);
        return json_response(StatusCode::FORBIDDEN, body.to_bytes());
    }

    let ctx = state.request_context(origin.into_inner(), body);
    let origin = ctx.origin.clone();

    let response =
        match tokio::time::timeout(state.request_timeout, state.processor.process(ctx)).await {
            Ok(response) => response,
            Err(_) => {
                warn!(
                    origin = %origin,
                    timeout_secs = state.request_timeout.as_secs(),
                    "request processing timed out"
                );
                let body =
                    JsonRpcResponse::error(codes::INTERNAL_ERROR, "request timed out", Value::Null);
                ProcessorResponse::json(StatusCode::GATEWAY_TIMEOUT.as_u16(), &body)
            }
        };

    let status = StatusCode::from_u16(response.status).unwrap_or_else(|_| {
        error!(status = response.status, "processor returned an invalid status code");
        StatusCode::BAD_GATEWAY
    });

    debug!(origin = %origin, status = status.as_u16(), "request processed");
    state.metrics.record_request("rpc", status.as_u16());

    json_response(status, response.body)
}

/// `/health`, any method.
#[allow(clippy::unused_async)]
pub async fn handle_health(State(state): State<Arc<GatewayState>>) -> Response {
    match serde_json::to_vec(&state.health.report()) {
        Ok(body) => {
            state.metrics.record_request("health", StatusCode::OK.as_u16());
            json_response(StatusCode::OK, body)
        }
        Err(e) => {
            error!(error = %e, "failed to serialize health report");
            state.metrics.record_request("health", StatusCode::INTERNAL_SERVER_ERROR.as_u16());
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[allow(clippy::unused_async)]
pub async fn handle_metrics(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.render(),
    )
}

#[allow(clippy::unused_async)]
pub async fn handle_not_found(State(state): State<Arc<GatewayState>>) -> StatusCode {
    state.metrics.record_request("unmatched", StatusCode::NOT_FOUND.as_u16());
    StatusCode::NOT_FOUND
}
