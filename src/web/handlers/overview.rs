//! Tour overview page handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use serde_json::{Map, Value};

use crate::domain::repositories::Document;
use crate::error::AppError;
use crate::state::AppState;

/// Summary of one tour as shown on a card.
#[derive(Debug, Clone, PartialEq)]
pub struct TourCard {
    pub id: String,
    pub name: String,
    pub summary: String,
    pub difficulty: String,
    pub duration: String,
    pub price: String,
}

fn text(document: &Document, field: &str) -> String {
    match document.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

impl From<&Document> for TourCard {
    fn from(document: &Document) -> Self {
        Self {
            id: text(document, "_id"),
            name: text(document, "name"),
            summary: text(document, "summary"),
            difficulty: text(document, "difficulty"),
            duration: text(document, "duration"),
            price: text(document, "price"),
        }
    }
}

/// Template for the overview page.
///
/// Renders `templates/overview.html` with one card per tour.
#[derive(Template, WebTemplate)]
#[template(path = "overview.html")]
pub struct OverviewTemplate {
    pub title: String,
    pub tours: Vec<TourCard>,
}

/// Renders the overview page.
///
/// # Endpoint
///
/// `GET /`
pub async fn overview_handler(State(state): State<AppState>) -> Result<OverviewTemplate, AppError> {
    let tours = state.documents.find("tours", &Map::new()).await?;

    Ok(OverviewTemplate {
        title: "All Tours".to_string(),
        tours: tours.iter().map(TourCard::from).collect(),
    })
}
