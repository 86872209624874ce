use reqwest::{Client, ClientBuilder};
use std::time::Duration;

use super::ProcessorError;

/// Builds the shared outbound client used for relay and proxy calls.
///
/// Redirects are disabled: neither backend should redirect a JSON-RPC POST,
/// and following one would replay a signed body against another host.
///
/// # Errors
///
/// Returns [`ProcessorError::Internal`] if the TLS backend cannot be initialised.
pub fn build_client(request_timeout: Duration) -> Result<Client, ProcessorError> {
    ClientBuilder::new()
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(64)
        .connect_timeout(Duration::from_secs(5))
        .timeout(request_timeout)
        .use_rustls_tls()
        .redirect(reqwest::redirect::Policy::none())
        .user_agent(concat!("protect-rpc/", env!("CARGO_PKG_VERSION")))
        .tcp_keepalive(Duration::from_secs(30))
        .tcp_nodelay(true)
        .build()
        .map_err(|e| {
            tracing::error!(error = %e, "failed to build http client");
            ProcessorError::Internal(format!("HTTP client build failed: {e}"))
        })
}

/// Describes a network error without echoing backend URLs or bodies to clients.
#[must_use]
pub fn sanitize_network_error(error: &reqwest::Error) -> String {
    if error.is_connect() {
        "connection refused or unreachable".to_string()
    } else if error.is_timeout() {
        "connection timed out".to_string()
    } else if error.is_body() {
        "response body error".to_string()
    } else if error.is_decode() {
        "response decode error".to_string()
    } else if error.is_redirect() {
        "unexpected redirect".to_string()
    } else if error.is_request() {
        "request failed".to_string()
    } else {
        "network error".to_string()
    }
}
