//! API route configuration.
//!
//! Every group serves one document collection with the same CRUD surface. A
//! method a path does not support is answered like an unknown path.

use crate::api::handlers::{
    Collection, create_handler, delete_handler, get_handler, list_handler, not_found_handler,
    update_handler,
};
use crate::state::AppState;
use axum::{Extension, Router, routing::get};

/// CRUD routes for one collection.
///
/// # Endpoints
///
/// - `GET    /`       - List documents (filtered by query)
/// - `POST   /`       - Create a document
/// - `GET    /{id}`   - Fetch a document
/// - `PATCH  /{id}`   - Update a document
/// - `DELETE /{id}`   - Delete a document
fn resource_routes(collection: &'static str) -> Router<AppState> {
    Router::new()
        .route("/", get(list_handler).post(create_handler))
        .route(
            "/{id}",
            get(get_handler).patch(update_handler).delete(delete_handler),
        )
        .method_not_allowed_fallback(not_found_handler)
        .layer(Extension(Collection(collection)))
}

/// `/api/v1/tours`
pub fn tours() -> Router<AppState> {
    resource_routes("tours")
}

/// `/api/v1/users`
pub fn users() -> Router<AppState> {
    resource_routes("users")
}

/// `/api/v1/reviews`
pub fn reviews() -> Router<AppState> {
    resource_routes("reviews")
}

/// `/api/v1/bookings`
pub fn bookings() -> Router<AppState> {
    resource_routes("bookings")
}

/// All API groups mounted under their version prefix.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/api/v1/tours", tours())
        .nest("/api/v1/users", users())
        .nest("/api/v1/reviews", reviews())
        .nest("/api/v1/bookings", bookings())
}
