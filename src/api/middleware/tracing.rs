//! Development request log.

use std::time::Duration;

use axum::extract::Request;
use axum::response::Response;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;
use tracing::Span;

/// Concrete layer type returned by [`layer`].
pub type DevTraceLayer = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    fn(&Request) -> Span,
    (),
    fn(&Response, Duration, &Span),
>;

/// One line per finished request: method, path, status and latency.
///
/// Mounted only with `APP_ENV=development`, outside the pipeline, so requests the
/// rate limiter or the body parser reject show up as well as asset hits.
///
/// ```text
/// INFO request{method=GET path=/api/v1/tours}: finished status=200 latency_ms=3
/// INFO request{method=POST path=/api/v1/tours}: finished status=413 latency_ms=0
/// ```
pub fn layer() -> DevTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(request_span as fn(&Request) -> Span)
        .on_request(())
        .on_response(log_response as fn(&Response, Duration, &Span))
}

fn request_span(req: &Request) -> Span {
    tracing::info_span!("request", method = %req.method(), path = %req.uri().path())
}

fn log_response(res: &Response, latency: Duration, _span: &Span) {
    tracing::info!(
        status = res.status().as_u16(),
        latency_ms = latency.as_millis() as u64,
        "finished"
    );
}
