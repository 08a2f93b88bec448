//! JSend-style success envelope.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// `{"status": "success", "requestedAt": ..., "results": ..., "data": {"data": ...}}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse<T> {
    pub status: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,

    pub data: DataEnvelope<T>,
}

#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T, requested_at: Option<DateTime<Utc>>) -> Self {
        Self {
            status: "success",
            requested_at,
            results: None,
            data: DataEnvelope { data },
        }
    }
}

impl<T> SuccessResponse<Vec<T>> {
    /// Envelope for a list, with `results` set to its length.
    pub fn list(items: Vec<T>, requested_at: Option<DateTime<Utc>>) -> Self {
        let mut response = Self::new(items, requested_at);
        response.results = Some(response.data.data.len());
        response
    }
}
