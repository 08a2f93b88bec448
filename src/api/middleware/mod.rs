//! HTTP middleware for request processing and protection.
//!
//! The [`pipeline`] orchestrator runs the request guards in order:
//!
//! - [`rate_limit`] - Fixed-window limiter per client identity
//! - [`body_parser`] - JSON / form decoding with a size cap
//! - [`cookies`] - `Cookie` header parsing
//! - [`sanitize`] - Operator-key and markup removal
//! - [`hpp`] - Parameter pollution guard
//! - [`request_time`] - Request timestamp
//!
//! Response-side layers: [`security_headers`], [`tracing`] (development only)
//! and [`error_handler`], which normalizes every error into a response.

pub mod body_parser;
pub mod cookies;
pub mod error_handler;
pub mod hpp;
pub mod pipeline;
pub mod rate_limit;
pub mod request_time;
pub mod sanitize;
pub mod security_headers;
pub mod tracing;
