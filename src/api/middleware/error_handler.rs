//! Error normalization.
//!
//! Turns every [`AppError`] into a client response. The shape depends on the
//! [`Environment`] and on whether the request targeted the API (`/api...`) or a
//! rendered page:
//!
//! | | API | Page |
//! |---|---|---|
//! | development | status, error detail, message, stack | error page with the real message |
//! | production | status and message (generic for defects) | error page, generic text for defects |
//!
//! Handlers return `Err(AppError)`; [`AppError`]'s `IntoResponse` leaves a marker
//! in the response extensions which [`layer`] replaces with the normalized body.
//! Pipeline guards call [`ErrorNormalizer::respond`] directly.

use std::any::Any;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{debug, error};

use crate::config::Environment;
use crate::error::{AppError, Classification, GENERIC_MESSAGE};
use crate::web::handlers::ErrorTemplate;

/// Title of the rendered error page.
pub const ERROR_PAGE_TITLE: &str = "Something went wrong!";

/// Text shown on the production error page for unclassified failures.
pub const PAGE_FALLBACK_MESSAGE: &str = "Please try again later.";

/// Whether a failed request expects JSON or HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Api,
    Page,
}

impl RequestKind {
    pub fn from_path(path: &str) -> Self {
        if path.starts_with("/api") {
            Self::Api
        } else {
            Self::Page
        }
    }
}

/// Formats errors for one deployment environment.
#[derive(Debug, Clone, Copy)]
pub struct ErrorNormalizer {
    environment: Environment,
}

impl ErrorNormalizer {
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Builds the client response for `err`.
    pub fn respond(&self, err: &AppError, kind: RequestKind) -> Response {
        let class = err.classify();
        record(err, &class);

        match (self.environment, kind) {
            (Environment::Development, RequestKind::Api) => development_json(err, &class),
            (Environment::Development, RequestKind::Page) => {
                let message = class
                    .origin
                    .filter(|_| !class.is_operational)
                    .map(|origin| origin.to_string())
                    .unwrap_or_else(|| class.message.clone());
                render_page(class.status, message)
            }
            (Environment::Production, RequestKind::Api) => production_json(&class),
            (Environment::Production, RequestKind::Page) => {
                if class.is_operational {
                    render_page(class.status, class.message.clone())
                } else {
                    render_page(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        PAGE_FALLBACK_MESSAGE.to_string(),
                    )
                }
            }
        }
    }
}

fn record(err: &AppError, class: &Classification<'_>) {
    if class.is_operational {
        debug!(
            status = class.status.as_u16(),
            kind = class.kind.as_str(),
            "Operational error: {}",
            class.message
        );
    } else {
        error!(error = ?err, "ERROR 💥 unexpected failure");
    }

    metrics::counter!(
        "http_errors_total",
        "kind" => class.kind.as_str(),
        "operational" => if class.is_operational { "true" } else { "false" }
    )
    .increment(1);
}

fn development_json(err: &AppError, class: &Classification<'_>) -> Response {
    let message = match class.origin {
        Some(origin) if !class.is_operational => origin.to_string(),
        _ => class.message.clone(),
    };

    let detail = class
        .origin
        .map(|origin| format!("{origin:#}"))
        .unwrap_or_else(|| class.message.clone());

    let stack = match err {
        AppError::Operational(op) => {
            format!("{}: {}\n{}", class.kind.as_str(), op.message(), op.backtrace())
        }
        AppError::Defect(origin) => format!("{origin:?}"),
    };

    let body = json!({
        "status": class.status_label(),
        "error": {
            "statusCode": class.status.as_u16(),
            "status": class.status_label(),
            "isOperational": class.is_operational,
            "name": class.kind.as_str(),
            "detail": detail,
        },
        "message": message,
        "stack": stack,
    });

    (class.status, Json(body)).into_response()
}

fn production_json(class: &Classification<'_>) -> Response {
    if class.is_operational {
        (
            class.status,
            Json(json!({
                "status": class.status_label(),
                "message": class.message,
            })),
        )
            .into_response()
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "error",
                "message": GENERIC_MESSAGE,
            })),
        )
            .into_response()
    }
}

fn render_page(status: StatusCode, msg: String) -> Response {
    let page = ErrorTemplate {
        title: ERROR_PAGE_TITLE.to_string(),
        msg,
    };
    (status, page).into_response()
}

/// Replaces error marker responses with normalized ones.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .nest("/api/v1/tours", tours())
///     .layer(middleware::from_fn_with_state(normalizer, error_handler::layer));
/// ```
pub async fn layer(State(normalizer): State<ErrorNormalizer>, req: Request, next: Next) -> Response {
    let kind = RequestKind::from_path(req.uri().path());
    let mut response = next.run(req).await;

    match response.extensions_mut().remove::<Arc<AppError>>() {
        Some(err) => normalizer.respond(&err, kind),
        None => response,
    }
}

/// Converts a handler panic into an unclassified failure.
///
/// Used with `CatchPanicLayer::custom`; the resulting marker response is then
/// normalized like any other defect.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::Defect(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistenceError;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn text_body(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn production() -> ErrorNormalizer {
        ErrorNormalizer::new(Environment::Production)
    }

    fn development() -> ErrorNormalizer {
        ErrorNormalizer::new(Environment::Development)
    }

    #[test]
    fn test_request_kind_from_path() {
        assert_eq!(RequestKind::from_path("/api/v1/tours"), RequestKind::Api);
        assert_eq!(RequestKind::from_path("/api"), RequestKind::Api);
        assert_eq!(RequestKind::from_path("/tour/the-forest-hiker"), RequestKind::Page);
        assert_eq!(RequestKind::from_path("/"), RequestKind::Page);
    }

    #[tokio::test]
    async fn test_production_api_operational() {
        let err = AppError::not_found("No tour found with that ID");

        let response = production().respond(&err, RequestKind::Api);

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(response).await,
            json!({"status": "fail", "message": "No tour found with that ID"})
        );
    }

    #[tokio::test]
    async fn test_production_api_defect_is_generic() {
        let err = AppError::from(anyhow::anyhow!("connection pool exhausted"));

        let response = production().respond(&err, RequestKind::Api);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({"status": "error", "message": "Something went wrong!"})
        );
    }

    #[tokio::test]
    async fn test_production_api_duplicate_key() {
        let err = AppError::from(PersistenceError::DuplicateKey {
            field: "name".into(),
            value: "\"The Forest Hiker\"".into(),
        });

        let response = production().respond(&err, RequestKind::Api);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(
            body["message"],
            "Duplicate field value: \"The Forest Hiker\". Please use another value!"
        );
    }

    #[tokio::test]
    async fn test_development_api_defect_exposes_detail() {
        let err = AppError::from(anyhow::anyhow!("connection pool exhausted"));

        let response = development().respond(&err, RequestKind::Api);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "connection pool exhausted");
        assert_eq!(body["error"]["statusCode"], 500);
        assert_eq!(body["error"]["isOperational"], false);
        assert!(body["stack"].as_str().unwrap().contains("connection pool exhausted"));
    }

    #[tokio::test]
    async fn test_development_api_operational() {
        let err = AppError::too_many_requests("slow down");

        let body = json_body(development().respond(&err, RequestKind::Api)).await;

        assert_eq!(body["status"], "fail");
        assert_eq!(body["message"], "slow down");
        assert_eq!(body["error"]["isOperational"], true);
        assert!(body["stack"].is_string());
    }

    #[tokio::test]
    async fn test_production_page_defect_hides_detail() {
        let err = AppError::from(anyhow::anyhow!("template engine exploded"));

        let response = production().respond(&err, RequestKind::Page);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = text_body(response).await;
        assert!(html.contains(ERROR_PAGE_TITLE));
        assert!(html.contains(PAGE_FALLBACK_MESSAGE));
        assert!(!html.contains("exploded"));
    }

    #[tokio::test]
    async fn test_production_page_operational_message() {
        let err = AppError::not_found("There is no tour with that name.");

        let response = production().respond(&err, RequestKind::Page);

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(text_body(response).await.contains("There is no tour with that name."));
    }

    #[tokio::test]
    async fn test_development_page_shows_message() {
        let err = AppError::from(anyhow::anyhow!("template engine exploded"));

        let response = development().respond(&err, RequestKind::Page);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(text_body(response).await.contains("template engine exploded"));
    }

    #[tokio::test]
    async fn test_panic_response_is_marker() {
        let response = panic_response(Box::new("boom"));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let err = response.extensions().get::<Arc<AppError>>().unwrap();
        assert!(!err.is_operational());
    }
}
