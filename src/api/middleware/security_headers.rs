//! Security response headers.

use axum::http::HeaderValue;
use axum::http::header::HeaderName;
use tower_http::set_header::SetResponseHeaderLayer;

pub static CROSS_ORIGIN_RESOURCE_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-resource-policy");

/// Attaches `Cross-Origin-Resource-Policy: cross-origin` to every response,
/// including rejections produced by the pipeline.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .nest("/api/v1/tours", tours())
///     .layer(security_headers::layer());
/// ```
pub fn layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(
        CROSS_ORIGIN_RESOURCE_POLICY.clone(),
        HeaderValue::from_static("cross-origin"),
    )
}
