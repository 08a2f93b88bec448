//! Domain layer: request model, rate limiting model and repository contracts.
//!
//! - [`context`] - [`context::RequestContext`] carried through the pipeline
//! - [`query`] - Bracket-nested query/form codec
//! - [`rate_limit`] - Fixed-window counters and policies
//! - [`repositories`] - Store trait definitions
//!
//! Nothing here depends on the infrastructure layer.

pub mod context;
pub mod query;
pub mod rate_limit;
pub mod repositories;
