//! Page route configuration.

use crate::api::handlers::not_found_handler;
use crate::state::AppState;
use crate::web::handlers::{overview_handler, tour_handler};
use axum::{Router, routing::get};

/// Page routes.
///
/// # Endpoints
///
/// - `GET /` - Overview of all tours
/// - `GET /tour/{id}` - Tour detail page
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(overview_handler))
        .route("/tour/{id}", get(tour_handler))
        .method_not_allowed_fallback(not_found_handler)
}
