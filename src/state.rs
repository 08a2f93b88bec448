use std::sync::Arc;

use crate::domain::repositories::DocumentRepository;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<dyn DocumentRepository>,
}

impl AppState {
    pub fn new(documents: Arc<dyn DocumentRepository>) -> Self {
        Self { documents }
    }
}
