//! Client identity extraction for rate limiting.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Identity used when no client address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Determines the client IP address of a request.
///
/// When `behind_proxy` is `true` the first valid address of `X-Forwarded-For` is
/// used, then `X-Real-IP`. The socket peer address is the fallback in both modes.
/// Enable `behind_proxy` only behind a trusted reverse proxy: otherwise clients can
/// pick their own identity.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
///
/// let ip = client_ip(&headers, None, true).unwrap();
/// assert_eq!(ip.to_string(), "203.0.113.7");
/// ```
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, behind_proxy: bool) -> Option<IpAddr> {
    if behind_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').find_map(|part| part.trim().parse().ok()));
        if forwarded.is_some() {
            return forwarded;
        }

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        if real_ip.is_some() {
            return real_ip;
        }
    }

    peer
}

/// Rate limiter key for a request: the client IP, or [`UNKNOWN_CLIENT`].
pub fn identity_key(headers: &HeaderMap, peer: Option<IpAddr>, behind_proxy: bool) -> String {
    client_ip(headers, peer, behind_proxy)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
