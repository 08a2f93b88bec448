//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`persistence`] - Document repository implementations
//! - [`rate_limit`] - Rate limit window stores (in-memory and Redis)

pub mod persistence;
pub mod rate_limit;
