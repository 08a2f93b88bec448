//! Error page template.

use askama::Template;
use askama_web::WebTemplate;

/// Renders `templates/error.html`.
///
/// Built by the error normalization layer for failed page requests; the status code
/// is set by the caller.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: String,
    pub msg: String,
}
