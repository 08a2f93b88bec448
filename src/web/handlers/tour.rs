//! Tour detail page handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;

use super::overview::TourCard;
use crate::api::extractors::DocumentId;
use crate::error::AppError;
use crate::state::AppState;

/// Template for the tour detail page.
#[derive(Template, WebTemplate)]
#[template(path = "tour.html")]
pub struct TourTemplate {
    pub title: String,
    pub tour: TourCard,
    pub description: String,
}

/// Renders the detail page of one tour.
///
/// # Endpoint
///
/// `GET /tour/{id}`
///
/// # Errors
///
/// - 404 "There is no tour with that name." if the tour does not exist
/// - 400 if `id` is malformed
pub async fn tour_handler(
    State(state): State<AppState>,
    DocumentId(id): DocumentId,
) -> Result<TourTemplate, AppError> {
    let document = state
        .documents
        .find_by_id("tours", &id)
        .await?
        .ok_or_else(|| AppError::not_found("There is no tour with that name."))?;

    let tour = TourCard::from(&document);
    let description = document
        .get("description")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Ok(TourTemplate {
        title: format!("{} Tour", tour.name),
        tour,
        description,
    })
}
