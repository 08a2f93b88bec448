//! REST API layer for HTTP request/response handling.
//!
//! # Modules
//!
//! - [`dto`] - Response envelopes
//! - [`extractors`] - Extractors that reject with [`crate::error::AppError`]
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Request pipeline, guards and error normalization
//! - [`routes`] - Route groups per collection

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
