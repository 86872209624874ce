//! Client origin resolution for admission control.
//!
//! The gateway usually runs behind a load balancer, so the first entry of
//! `X-Forwarded-For` is preferred over the socket peer address.

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap, HeaderName},
};
use std::{convert::Infallible, fmt, net::SocketAddr};

pub static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// The address a request is attributed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientOrigin(String);

impl ClientOrigin {
    pub fn new(origin: impl Into<String>) -> Self {
        Self(origin.into())
    }

    /// Resolves the origin from forwarding headers, falling back to the peer IP.
    ///
    /// Returns an empty origin when neither is available.
    #[must_use]
    pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let forwarded = headers
            .get(&X_FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|first| !first.is_empty());

        match (forwarded, peer) {
            (Some(first), _) => Self(first.to_string()),
            (None, Some(addr)) => Self(addr.ip().to_string()),
            (None, None) => Self(String::new()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ClientOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S> FromRequestParts<S> for ClientOrigin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts.extensions.get::<ConnectInfo<SocketAddr>>().map(|info| info.0);
        Ok(Self::resolve(&parts.headers, peer))
    }
}
