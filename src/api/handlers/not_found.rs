//! Fallback for unmatched requests.

use axum::extract::OriginalUri;
use axum::http::Extensions;

use crate::domain::context::RequestContext;
use crate::error::AppError;

/// Raises `404 Can't find {url} on this server!` for any request no route matched.
///
/// `{url}` is the path and query as the client sent them, before sanitization.
/// The response body is produced by the error normalization layer.
pub async fn not_found_handler(OriginalUri(uri): OriginalUri, extensions: Extensions) -> AppError {
    let url = match extensions.get::<RequestContext>() {
        Some(context) => context.original_url().to_string(),
        None => uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string()),
    };

    AppError::not_found(format!("Can't find {url} on this server!"))
}
