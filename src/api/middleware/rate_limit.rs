//! Fixed-window rate limiting guard.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use chrono::{DateTime, Utc};
use tracing::{error, warn};

use super::pipeline::{Exchange, Guard};
use crate::domain::rate_limit::{RateLimitPolicy, RateLimitStatus};
use crate::domain::repositories::RateLimitStore;
use crate::error::AppError;
use crate::utils::clock::Clock;

/// Message sent with every `429` response.
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, try after 1 hour";

pub static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub static X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Counts every request against its client identity.
///
/// # Limits
///
/// - **Requests**: `policy.max_requests` per identity (default 100)
/// - **Window**: fixed, starting at the first request (default 1 hour)
///
/// Requests exceeding the limit receive `429 Too Many Requests` and never reach
/// the router. Every response, admitted or not, carries the
/// `X-RateLimit-Limit`, `X-RateLimit-Remaining` and `X-RateLimit-Reset` headers;
/// rejections also carry `Retry-After`.
///
/// # Key Extraction
///
/// The identity is the client IP address (see [`crate::utils::client_ip`]),
/// computed once when the request enters the pipeline.
///
/// A failing store is not treated as "admit": the error is forwarded to the error
/// normalizer as an unclassified failure.
pub struct RateLimitGuard {
    store: Arc<dyn RateLimitStore>,
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
}

impl RateLimitGuard {
    pub fn new(store: Arc<dyn RateLimitStore>, policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }
}

#[async_trait]
impl Guard for RateLimitGuard {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    async fn check(&self, exchange: &mut Exchange) -> Result<(), AppError> {
        let identity = exchange.context.identity.clone();
        let now = self.clock.now();

        let snapshot = self
            .store
            .hit(&identity, now, &self.policy)
            .await
            .map_err(|e| {
                error!(identity = %identity, "Rate limit store failed: {}", e);
                AppError::Defect(anyhow::Error::new(e).context("rate limit store unavailable"))
            })?;

        let status = RateLimitStatus::from_snapshot(snapshot, &self.policy);
        exchange.context.rate_limit = Some(status);

        if status.admitted {
            Ok(())
        } else {
            warn!(identity = %identity, limit = status.limit, "Rate limit exceeded");
            metrics::counter!("rate_limit_rejections_total").increment(1);
            Err(AppError::too_many_requests(RATE_LIMIT_MESSAGE))
        }
    }
}

/// Writes the rate limit headers for `status` onto a response.
pub fn apply_headers(headers: &mut HeaderMap, status: &RateLimitStatus, now: DateTime<Utc>) {
    headers.insert(X_RATELIMIT_LIMIT.clone(), HeaderValue::from(status.limit));
    headers.insert(
        X_RATELIMIT_REMAINING.clone(),
        HeaderValue::from(status.remaining),
    );
    headers.insert(
        X_RATELIMIT_RESET.clone(),
        HeaderValue::from(status.resets_at.timestamp()),
    );

    if !status.admitted {
        headers.insert(RETRY_AFTER, HeaderValue::from(status.retry_after_secs(now)));
    }
}
