//! # Booking Gateway
//!
//! The request-processing front door of a tour booking service, built with Axum.
//!
//! Every request passes an ordered pipeline of guards (rate limiting, bounded body
//! parsing, cookie parsing, operator-key and markup sanitization, parameter
//! pollution protection, timestamping) before reaching the tour, user, review and
//! booking routes. Every failure, wherever it happens, is turned into one
//! consistent response by the error normalization layer.
//!
//! ## Architecture
//!
//! - **Domain Layer** ([`domain`]) - Request context, rate limit model, store traits
//! - **Infrastructure Layer** ([`infrastructure`]) - Rate limit stores and document collections
//! - **API Layer** ([`api`]) - Pipeline, guards, error normalization, REST handlers
//! - **Web Layer** ([`web`]) - Rendered pages
//!
//! ## Quick Start
//!
//! ```bash
//! export APP_ENV=development
//! export REDIS_URL="redis://localhost:6379"  # Optional
//!
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;
pub mod web;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::api::middleware::pipeline::Pipeline;
    pub use crate::config::{Config, Environment};
    pub use crate::domain::context::RequestContext;
    pub use crate::domain::repositories::{DocumentRepository, RateLimitStore};
    pub use crate::error::{AppError, PersistenceError};
    pub use crate::infrastructure::persistence::MemoryDocumentRepository;
    pub use crate::infrastructure::rate_limit::MemoryRateLimitStore;
    pub use crate::routes::{app_router, service_router};
    pub use crate::state::AppState;
    pub use crate::utils::clock::{Clock, ManualClock, SystemClock};
}
