//! Rendered pages.
//!
//! Uses Askama templates for server-side rendering. Failures on these routes are
//! rendered with the error page instead of JSON.
//!
//! # Modules
//!
//! - [`handlers`] - Template rendering handlers
//! - [`routes`] - Page route configuration

pub mod handlers;
pub mod routes;
