//! Request pipeline orchestrator.
//!
//! Runs an explicit, ordered list of [`Guard`]s against every request. Each guard
//! either mutates the [`Exchange`] and lets the next one run, or returns an
//! [`AppError`], which skips every remaining guard and the router and goes
//! straight to the [`ErrorNormalizer`].
//!
//! The standard order is:
//!
//! 1. rate limiting
//! 2. body parsing with size cap
//! 3. cookie parsing
//! 4. operator-key sanitization
//! 5. markup sanitization
//! 6. parameter pollution guard
//! 7. request timestamp
//!
//! After the last guard the request is rebuilt from the sanitized context and
//! handed to the inner service (compression, error normalization, router).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::CONTENT_LENGTH;
use axum::http::request::Parts;
use axum::http::uri::PathAndQuery;
use axum::http::{HeaderValue, Uri};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use super::body_parser::BodyParserGuard;
use super::cookies::CookieParserGuard;
use super::error_handler::{ErrorNormalizer, RequestKind};
use super::hpp::ParameterPollutionGuard;
use super::rate_limit::{self, RateLimitGuard};
use super::request_time::RequestTimeGuard;
use super::sanitize::{MarkupSanitizerGuard, QuerySanitizerGuard};
use crate::config::Config;
use crate::domain::context::RequestContext;
use crate::domain::query;
use crate::domain::rate_limit::RateLimitPolicy;
use crate::domain::repositories::RateLimitStore;
use crate::error::AppError;
use crate::utils::client_ip::identity_key;
use crate::utils::clock::Clock;

/// One stage of the request pipeline.
#[async_trait]
pub trait Guard: Send + Sync {
    /// Short stage name used in logs.
    fn name(&self) -> &'static str;

    /// Inspects or mutates the request.
    ///
    /// # Errors
    ///
    /// Any error ends the pipeline for this request.
    async fn check(&self, exchange: &mut Exchange) -> Result<(), AppError>;
}

/// A request in flight through the pipeline.
pub struct Exchange {
    pub context: RequestContext,
    parts: Parts,
    body: Option<Body>,
}

impl Exchange {
    /// Splits a request and builds its [`RequestContext`].
    pub fn new(req: Request, behind_proxy: bool) -> Self {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let (parts, body) = req.into_parts();
        let identity = identity_key(&parts.headers, peer, behind_proxy);

        let context = RequestContext::new(
            parts.method.clone(),
            parts.uri.clone(),
            parts.headers.clone(),
            identity,
        );

        Self {
            context,
            parts,
            body: Some(body),
        }
    }

    /// Takes the raw body stream. Returns `None` once a guard consumed it.
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// Puts back a body stream that a guard decided not to decode.
    pub fn restore_body(&mut self, body: Body) {
        self.body = Some(body);
    }

    /// Rebuilds the request from the (sanitized) context.
    ///
    /// Headers and query come from the context; a decoded body is re-encoded and
    /// its `Content-Length` updated; an untouched body stream is forwarded as is.
    /// The context itself is attached as a request extension.
    pub fn into_request(self) -> Request {
        let Self {
            context,
            mut parts,
            body,
        } = self;

        parts.headers = context.headers.clone();
        parts.uri = rebuild_uri(&parts.uri, &context);

        let body = match body {
            Some(untouched) => untouched,
            None => {
                let bytes = context.body.to_bytes().unwrap_or_default();
                parts
                    .headers
                    .insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
                Body::from(bytes)
            }
        };

        parts.extensions.insert(context);
        Request::from_parts(parts, body)
    }
}

fn rebuild_uri(current: &Uri, context: &RequestContext) -> Uri {
    let path = current.path();
    let path_and_query = if context.query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query::encode(&context.query))
    };

    let mut uri_parts = current.clone().into_parts();
    uri_parts.path_and_query = PathAndQuery::try_from(path_and_query).ok();

    Uri::from_parts(uri_parts).unwrap_or_else(|_| current.clone())
}

/// The ordered guard list plus the error normalizer it short-circuits into.
pub struct Pipeline {
    guards: Vec<Arc<dyn Guard>>,
    normalizer: ErrorNormalizer,
    clock: Arc<dyn Clock>,
    behind_proxy: bool,
}

impl Pipeline {
    pub fn new(
        guards: Vec<Arc<dyn Guard>>,
        normalizer: ErrorNormalizer,
        clock: Arc<dyn Clock>,
        behind_proxy: bool,
    ) -> Self {
        Self {
            guards,
            normalizer,
            clock,
            behind_proxy,
        }
    }

    /// Builds the standard guard chain from the service configuration.
    pub fn standard(config: &Config, store: Arc<dyn RateLimitStore>, clock: Arc<dyn Clock>) -> Self {
        let policy = RateLimitPolicy::new(
            config.rate_limit_max,
            Duration::from_secs(config.rate_limit_window_secs),
        );

        let guards: Vec<Arc<dyn Guard>> = vec![
            Arc::new(RateLimitGuard::new(store, policy, clock.clone())),
            Arc::new(BodyParserGuard::new(config.body_limit_bytes)),
            Arc::new(CookieParserGuard),
            Arc::new(QuerySanitizerGuard),
            Arc::new(MarkupSanitizerGuard),
            Arc::new(ParameterPollutionGuard::default()),
            Arc::new(RequestTimeGuard::new(clock.clone())),
        ];

        Self::new(
            guards,
            ErrorNormalizer::new(config.environment),
            clock,
            config.behind_proxy,
        )
    }

    pub fn normalizer(&self) -> ErrorNormalizer {
        self.normalizer
    }

    pub fn guard_names(&self) -> Vec<&'static str> {
        self.guards.iter().map(|g| g.name()).collect()
    }

    /// Runs every guard in order, stopping at the first failure.
    pub async fn run(&self, exchange: &mut Exchange) -> Result<(), AppError> {
        for guard in &self.guards {
            debug!(guard = guard.name(), "running guard");
            if let Err(err) = guard.check(exchange).await {
                debug!(guard = guard.name(), "guard rejected request");
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Middleware entry point for the [`Pipeline`].
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .nest("/api/v1/tours", tours())
///     .layer(middleware::from_fn_with_state(Arc::new(pipeline), pipeline::layer));
/// ```
pub async fn layer(State(pipeline): State<Arc<Pipeline>>, req: Request, next: Next) -> Response {
    let mut exchange = Exchange::new(req, pipeline.behind_proxy);
    let kind = RequestKind::from_path(exchange.context.original_uri.path());

    let outcome = pipeline.run(&mut exchange).await;
    let rate_limit = exchange.context.rate_limit;

    let mut response = match outcome {
        Ok(()) => next.run(exchange.into_request()).await,
        Err(err) => pipeline.normalizer.respond(&err, kind),
    };

    if let Some(status) = rate_limit {
        rate_limit::apply_headers(response.headers_mut(), &status, pipeline.clock.now());
    }

    response
}
