//! Request extractors whose rejections are [`AppError`]s.
//!
//! axum's own rejections render as plain text and bypass error normalization;
//! the wrappers here turn them into operational errors instead.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use tracing::debug;

use crate::error::AppError;

/// The `{id}` segment of a document route.
///
/// A segment that does not decode (e.g. `%FF`) is rejected with
/// `400 Invalid _id: %FF.`, the same message a malformed id gets from the
/// document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentId(pub String);

impl<S> FromRequestParts<S> for DocumentId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<String>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(Self(id)),
            Err(rejection) => {
                debug!(%rejection, "Rejected document id");
                let raw = parts.uri.path().rsplit('/').next().unwrap_or_default();
                Err(AppError::bad_request(format!("Invalid _id: {raw}.")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    async fn echo(DocumentId(id): DocumentId) -> String {
        id
    }

    fn app() -> Router {
        Router::new().route("/items/{id}", get(echo))
    }

    fn request(uri: &str) -> Request {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_decodes_valid_segment() {
        let response = app().oneshot(request("/items/abc%20def")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_undecodable_segment_is_app_error() {
        let response = app().oneshot(request("/items/%FF")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let err = response.extensions().get::<std::sync::Arc<AppError>>().unwrap();
        assert!(err.is_operational());
        assert_eq!(err.classify().message, "Invalid _id: %FF.");
    }
}
