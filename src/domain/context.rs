//! Per-request context populated by the pipeline guards.

use axum::body::Bytes;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Uri};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::domain::rate_limit::RateLimitStatus;
use crate::error::AppError;

/// Decoded request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body was sent.
    #[default]
    Empty,
    /// `application/json` body.
    Json(Value),
    /// `application/x-www-form-urlencoded` body, decoded with bracket nesting.
    Form(Map<String, Value>),
    /// Any other content type; the body stream is forwarded untouched.
    Unparsed,
}

impl RequestBody {
    /// Returns the body as a JSON object when it is one.
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Json(Value::Object(map)) | Self::Form(map) => Some(map),
            _ => None,
        }
    }

    /// Re-encodes a decoded body, or `None` for [`RequestBody::Unparsed`].
    pub fn to_bytes(&self) -> Option<Bytes> {
        match self {
            Self::Empty => Some(Bytes::new()),
            Self::Json(value) => Some(Bytes::from(value.to_string())),
            Self::Form(map) => Some(Bytes::from(crate::domain::query::encode(map))),
            Self::Unparsed => None,
        }
    }
}

/// Everything the pipeline learned about a request.
///
/// Handlers extract it directly; by the time they run it has been rate limited,
/// size bounded, sanitized and stamped.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// The URI exactly as the client sent it.
    pub original_uri: Uri,
    pub headers: HeaderMap,
    /// Key used by the rate limiter (client IP or `unknown`).
    pub identity: String,
    pub query: Map<String, Value>,
    /// Values dropped by the parameter pollution guard, keyed by parameter.
    pub query_polluted: Map<String, Value>,
    pub body: RequestBody,
    pub cookies: BTreeMap<String, String>,
    pub requested_at: Option<DateTime<Utc>>,
    pub rate_limit: Option<RateLimitStatus>,
}

impl RequestContext {
    pub fn new(method: Method, original_uri: Uri, headers: HeaderMap, identity: String) -> Self {
        let query = original_uri
            .query()
            .map(|q| crate::domain::query::parse(q.as_bytes()))
            .unwrap_or_default();

        Self {
            method,
            original_uri,
            headers,
            identity,
            query,
            query_polluted: Map::new(),
            body: RequestBody::Empty,
            cookies: BTreeMap::new(),
            requested_at: None,
            rate_limit: None,
        }
    }

    /// Path and query of the original request, e.g. `/foo?x=1`.
    pub fn original_url(&self) -> &str {
        self.original_uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| {
                AppError::Defect(anyhow::anyhow!(
                    "request context missing: the pipeline layer is not installed"
                ))
            })
    }
}
