//! Static CORS headers attached to every response.

use axum::http::{
    header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN},
    HeaderValue,
};
use tower_http::set_header::SetResponseHeaderLayer;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "Accept,Content-Type";

/// Returns the two header layers. Handlers cannot override the values.
///
/// ```ignore
/// let (allow_origin, allow_headers) = create_cors_layers();
/// let app = Router::new().route("/", get(handler)).layer(allow_origin).layer(allow_headers);
/// ```
#[must_use]
pub fn create_cors_layers() -> (SetResponseHeaderLayer<HeaderValue>, SetResponseHeaderLayer<HeaderValue>)
{
    let allow_origin = SetResponseHeaderLayer::overriding(
        ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    let allow_headers = SetResponseHeaderLayer::overriding(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );

    (allow_origin, allow_headers)
}
