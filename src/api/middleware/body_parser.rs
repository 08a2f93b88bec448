//! Body decoding with a size cap.

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use tracing::debug;

use super::pipeline::{Exchange, Guard};
use crate::domain::context::RequestBody;
use crate::domain::query;
use crate::error::AppError;

/// Default body cap: 10 KiB.
pub const DEFAULT_BODY_LIMIT: usize = 10 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Json,
    Form,
    Other,
    Absent,
}

fn body_format(headers: &HeaderMap) -> BodyFormat {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return BodyFormat::Absent;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence == "application/json" || essence.ends_with("+json") {
        BodyFormat::Json
    } else if essence == "application/x-www-form-urlencoded" {
        BodyFormat::Form
    } else {
        BodyFormat::Other
    }
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Decodes JSON and URL-encoded form bodies into the request context.
///
/// Bodies above `limit` bytes are rejected with `413` before anything else sees
/// them, whether the size is declared up front or only discovered while reading.
/// Malformed JSON is rejected with `400`. Other content types are not read and
/// their stream is forwarded untouched.
pub struct BodyParserGuard {
    limit: usize,
}

impl BodyParserGuard {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    fn too_large(&self) -> AppError {
        AppError::payload_too_large(format!(
            "Request body is larger than {} bytes",
            self.limit
        ))
    }
}

impl Default for BodyParserGuard {
    fn default() -> Self {
        Self::new(DEFAULT_BODY_LIMIT)
    }
}

#[async_trait]
impl Guard for BodyParserGuard {
    fn name(&self) -> &'static str {
        "body_parser"
    }

    async fn check(&self, exchange: &mut Exchange) -> Result<(), AppError> {
        let format = body_format(&exchange.context.headers);

        if matches!(format, BodyFormat::Absent | BodyFormat::Other) {
            if format == BodyFormat::Other {
                exchange.context.body = RequestBody::Unparsed;
            }
            return Ok(());
        }

        if declared_length(&exchange.context.headers).is_some_and(|len| len > self.limit) {
            debug!(limit = self.limit, "Declared body length over limit");
            return Err(self.too_large());
        }

        let Some(body) = exchange.take_body() else {
            return Ok(());
        };

        let bytes = match Limited::new(body, self.limit).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                return Err(self.too_large());
            }
            Err(e) => {
                debug!("Failed to read request body: {}", e);
                return Err(AppError::bad_request("Failed to read request body"));
            }
        };

        exchange.context.body = if bytes.is_empty() {
            RequestBody::Empty
        } else {
            match format {
                BodyFormat::Json => serde_json::from_slice(&bytes)
                    .map(RequestBody::Json)
                    .map_err(|_| AppError::bad_request("Invalid JSON body"))?,
                _ => RequestBody::Form(query::parse(&bytes)),
            }
        };

        Ok(())
    }
}
