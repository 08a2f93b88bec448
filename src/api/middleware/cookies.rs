//! Cookie header parsing.

use std::collections::BTreeMap;

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use percent_encoding::percent_decode_str;

use super::pipeline::{Exchange, Guard};
use crate::error::AppError;

/// Parses every `Cookie` header into a name/value map.
///
/// # Cookie Format
///
/// ```text
/// Cookie: jwt=<token>; theme=dark
/// ```
///
/// Pairs are split on semicolons and the first `=`. Values wrapped in double
/// quotes are unquoted, then percent-decoded; a value that does not decode to
/// UTF-8 is kept as sent. Pairs without a name are ignored; for repeated names
/// the first occurrence wins.
pub fn parse_cookies(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut cookies = BTreeMap::new();

    for header in headers.get_all(COOKIE) {
        let Ok(cookie_str) = header.to_str() else {
            continue;
        };

        for cookie in cookie_str.split(';') {
            let mut parts = cookie.trim().splitn(2, '=');
            let (Some(name), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };

            let name = name.trim();
            if name.is_empty() {
                continue;
            }

            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);

            cookies
                .entry(name.to_string())
                .or_insert_with(|| decode_value(value));
        }
    }

    cookies
}

fn decode_value(raw: &str) -> String {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Fills [`crate::domain::context::RequestContext::cookies`]. Never rejects.
pub struct CookieParserGuard;

#[async_trait]
impl Guard for CookieParserGuard {
    fn name(&self) -> &'static str {
        "cookie_parser"
    }

    async fn check(&self, exchange: &mut Exchange) -> Result<(), AppError> {
        exchange.context.cookies = parse_cookies(&exchange.context.headers);
        Ok(())
    }
}
