//! Top-level router configuration combining API and page routes.
//!
//! # Route Structure
//!
//! - `GET  /`, `GET /tour/{id}` - Rendered pages
//! - `/api/v1/{tours,users,reviews,bookings}` - REST API
//! - `/static/*`                - Static assets, served ahead of the pipeline
//! - anything else              - `404 Can't find ... on this server!`
//!
//! # Middleware
//!
//! Outermost first:
//!
//! 1. **Path normalization** - Trailing slash handling
//! 2. **CORS** - Any origin
//! 3. **Security headers** - `Cross-Origin-Resource-Policy`
//! 4. **Tracing** - Request log, development only
//! 5. **Pipeline** - Rate limiting, body parsing, cookies, sanitization, HPP, timestamp.
//!    `/static` branches off before this point.
//! 6. **Compression** - Response bodies
//! 7. **Error normalization** - Turns handler errors into responses
//! 8. **Panic catcher** - Turns handler panics into errors

use std::sync::Arc;

use crate::api;
use crate::api::handlers::not_found_handler;
use crate::api::middleware::pipeline::{self, Pipeline};
use crate::api::middleware::{error_handler, security_headers, tracing};
use crate::state::AppState;
use crate::web;
use axum::handler::HandlerWithoutStateExt;
use axum::http::Method;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::services::ServeDir;

/// Cross-origin access for any origin, without credentials.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(Any)
        .allow_credentials(false)
}

/// Builds the router and its middleware stack, without path normalization.
///
/// # Arguments
///
/// - `state` - shared application state injected into all handlers
/// - `pipeline` - the request guards; its error normalizer also formats handler errors
/// - `static_dir` - directory served under `/static`
pub fn service_router(state: AppState, pipeline: Arc<Pipeline>, static_dir: &str) -> Router {
    let normalizer = pipeline.normalizer();
    let development = normalizer.environment().is_development();

    let app = Router::new()
        .merge(web::routes::page_routes())
        .merge(api::routes::api_routes())
        .fallback(not_found_handler)
        .with_state(state)
        .layer(CatchPanicLayer::custom(error_handler::panic_response))
        .layer(middleware::from_fn_with_state(
            normalizer,
            error_handler::layer,
        ))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn_with_state(pipeline, pipeline::layer));

    // Assets skip the pipeline: they are neither rate limited nor sanitized.
    let static_files = ServeDir::new(static_dir)
        .call_fallback_on_method_not_allowed(true)
        .not_found_service(not_found_handler.into_service());
    let assets = middleware::from_fn_with_state(normalizer, error_handler::layer).layer(static_files);

    let router = Router::new()
        .nest_service("/static", assets)
        .fallback_service(app);

    let router = if development {
        router.layer(tracing::layer())
    } else {
        router
    };

    router.layer(security_headers::layer()).layer(cors_layer())
}

/// Constructs the application with all routes and middleware.
///
/// `/api/v1/tours/` is served like `/api/v1/tours`.
pub fn app_router(state: AppState, pipeline: Arc<Pipeline>, static_dir: &str) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(service_router(state, pipeline, static_dir))
}
