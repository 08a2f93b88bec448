//! Sanitization guards for query operators and markup.

use async_trait::async_trait;
use axum::http::HeaderName;
use tracing::debug;

use super::pipeline::{Exchange, Guard};
use crate::domain::context::RequestBody;
use crate::error::AppError;
use crate::utils::sanitize::{
    is_operator_key, strip_markup_in_map, strip_markup_in_value, strip_operator_keys,
    strip_operator_keys_in_map,
};

/// Removes `$`-prefixed and dotted keys from the query, the body and the header names.
pub struct QuerySanitizerGuard;

#[async_trait]
impl Guard for QuerySanitizerGuard {
    fn name(&self) -> &'static str {
        "query_sanitizer"
    }

    async fn check(&self, exchange: &mut Exchange) -> Result<(), AppError> {
        let context = &mut exchange.context;

        let mut removed = strip_operator_keys_in_map(&mut context.query);
        removed += match &mut context.body {
            RequestBody::Json(value) => strip_operator_keys(value),
            RequestBody::Form(map) => strip_operator_keys_in_map(map),
            RequestBody::Empty | RequestBody::Unparsed => 0,
        };

        let polluted_headers: Vec<HeaderName> = context
            .headers
            .keys()
            .filter(|name| is_operator_key(name.as_str()))
            .cloned()
            .collect();
        for name in &polluted_headers {
            context.headers.remove(name);
        }
        removed += polluted_headers.len();

        if removed > 0 {
            debug!(identity = %context.identity, removed, "Stripped operator keys");
        }
        Ok(())
    }
}

/// Strips script blocks and tags from every string value in the query and the body.
pub struct MarkupSanitizerGuard;

#[async_trait]
impl Guard for MarkupSanitizerGuard {
    fn name(&self) -> &'static str {
        "markup_sanitizer"
    }

    async fn check(&self, exchange: &mut Exchange) -> Result<(), AppError> {
        let context = &mut exchange.context;

        strip_markup_in_map(&mut context.query);
        match &mut context.body {
            RequestBody::Json(value) => strip_markup_in_value(value),
            RequestBody::Form(map) => strip_markup_in_map(map),
            RequestBody::Empty | RequestBody::Unparsed => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::Request;
    use serde_json::{Value, json};

    fn exchange(uri: &str, body: RequestBody) -> Exchange {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let mut ex = Exchange::new(req, false);
        ex.context.body = body;
        ex
    }

    #[tokio::test]
    async fn test_operator_keys_removed_from_body_and_query() {
        let mut ex = exchange(
            "/api/v1/users?role[$ne]=admin&name=x",
            RequestBody::Json(json!({"email": {"$gt": ""}, "password": "pass1234"})),
        );

        QuerySanitizerGuard.check(&mut ex).await.unwrap();

        assert_eq!(
            ex.context.body,
            RequestBody::Json(json!({"email": {}, "password": "pass1234"}))
        );
        assert_eq!(Value::Object(ex.context.query), json!({"role": {}, "name": "x"}));
    }

    #[tokio::test]
    async fn test_operator_header_names_removed() {
        let req = Request::builder()
            .uri("/")
            .header("x.forwarded.role", "admin")
            .header("$where", "1")
            .header("accept", "application/json")
            .body(Body::empty())
            .unwrap();
        let mut ex = Exchange::new(req, false);

        QuerySanitizerGuard.check(&mut ex).await.unwrap();

        assert_eq!(ex.context.headers.len(), 1);
        assert!(ex.context.headers.contains_key("accept"));
    }

    #[tokio::test]
    async fn test_markup_removed_from_body_and_query() {
        let mut ex = exchange(
            "/api/v1/tours?name=%3Cb%3EHiker%3C%2Fb%3E",
            RequestBody::Json(json!({"name": "<script>alert(1)</script>Tour", "price": 10})),
        );

        MarkupSanitizerGuard.check(&mut ex).await.unwrap();

        assert_eq!(
            ex.context.body,
            RequestBody::Json(json!({"name": "Tour", "price": 10}))
        );
        assert_eq!(ex.context.query["name"], "Hiker");
    }

    #[tokio::test]
    async fn test_unparsed_body_untouched() {
        let mut ex = exchange("/", RequestBody::Unparsed);

        QuerySanitizerGuard.check(&mut ex).await.unwrap();
        MarkupSanitizerGuard.check(&mut ex).await.unwrap();

        assert_eq!(ex.context.body, RequestBody::Unparsed);
    }
}
