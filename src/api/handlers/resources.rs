//! Generic CRUD handlers shared by the tour, user, review and booking groups.
//!
//! The collection a handler works on is attached to its route group as an
//! [`Extension<Collection>`].

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Map, Value};

use crate::api::dto::response::SuccessResponse;
use crate::api::extractors::DocumentId;
use crate::domain::context::{RequestBody, RequestContext};
use crate::domain::repositories::Document;
use crate::error::AppError;
use crate::state::AppState;

/// Query parameters that control presentation, not filtering.
pub const EXCLUDED_FILTER_FIELDS: &[&str] = &["page", "sort", "limit", "fields"];

/// Name of the collection a route group serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection(pub &'static str);

fn not_found() -> AppError {
    AppError::not_found("No document found with that ID")
}

/// The decoded request body as document fields. A missing body counts as empty.
fn document_fields(context: &RequestContext) -> Result<Map<String, Value>, AppError> {
    match &context.body {
        RequestBody::Empty => Ok(Map::new()),
        body => body
            .as_object()
            .cloned()
            .ok_or_else(|| AppError::bad_request("Request body must be a JSON object")),
    }
}

/// Builds the repository filter from the sanitized query.
pub fn filter_from_query(query: &Map<String, Value>) -> Map<String, Value> {
    let mut filter = query.clone();
    for field in EXCLUDED_FILTER_FIELDS {
        filter.remove(*field);
    }
    filter
}

/// Lists documents, filtered by the query string.
///
/// # Endpoint
///
/// `GET /api/v1/{collection}?difficulty=easy&price[lt]=1500`
///
/// `page`, `sort`, `limit` and `fields` are accepted but ignored.
pub async fn list_handler(
    State(state): State<AppState>,
    Extension(Collection(collection)): Extension<Collection>,
    context: RequestContext,
) -> Result<Json<SuccessResponse<Vec<Document>>>, AppError> {
    let filter = filter_from_query(&context.query);
    let documents = state.documents.find(collection, &filter).await?;

    Ok(Json(SuccessResponse::list(documents, context.requested_at)))
}

/// Returns one document.
///
/// # Endpoint
///
/// `GET /api/v1/{collection}/{id}`
///
/// # Errors
///
/// - 400 if `id` is malformed
/// - 404 if no document has this id
pub async fn get_handler(
    State(state): State<AppState>,
    Extension(Collection(collection)): Extension<Collection>,
    DocumentId(id): DocumentId,
    context: RequestContext,
) -> Result<Json<SuccessResponse<Document>>, AppError> {
    let document = state
        .documents
        .find_by_id(collection, &id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(SuccessResponse::new(document, context.requested_at)))
}

/// Creates a document from the sanitized body.
///
/// # Endpoint
///
/// `POST /api/v1/{collection}`
///
/// # Errors
///
/// 400 when required fields are missing or a unique field is taken.
pub async fn create_handler(
    State(state): State<AppState>,
    Extension(Collection(collection)): Extension<Collection>,
    context: RequestContext,
) -> Result<impl IntoResponse, AppError> {
    let fields = document_fields(&context)?;
    let document = state.documents.insert(collection, fields).await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(document, context.requested_at)),
    ))
}

/// Merges the sanitized body into a document.
///
/// # Endpoint
///
/// `PATCH /api/v1/{collection}/{id}`
pub async fn update_handler(
    State(state): State<AppState>,
    Extension(Collection(collection)): Extension<Collection>,
    DocumentId(id): DocumentId,
    context: RequestContext,
) -> Result<Json<SuccessResponse<Document>>, AppError> {
    let fields = document_fields(&context)?;
    let document = state
        .documents
        .update(collection, &id, fields)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(SuccessResponse::new(document, context.requested_at)))
}

/// Deletes a document.
///
/// # Endpoint
///
/// `DELETE /api/v1/{collection}/{id}`
///
/// # Response Codes
///
/// - **204 No Content**: deleted
/// - **404 Not Found**: no document has this id
pub async fn delete_handler(
    State(state): State<AppState>,
    Extension(Collection(collection)): Extension<Collection>,
    DocumentId(id): DocumentId,
) -> Result<StatusCode, AppError> {
    if state.documents.delete(collection, &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}
