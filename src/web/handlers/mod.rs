//! HTML template rendering handlers.

mod error;
mod overview;
mod tour;

pub use error::ErrorTemplate;
pub use overview::{OverviewTemplate, TourCard, overview_handler};
pub use tour::{TourTemplate, tour_handler};
