//! Repository trait definitions for the domain layer.
//!
//! These traits abstract the two stores the gateway talks to. Concrete
//! implementations live in `crate::infrastructure`.
//!
//! # Available Repositories
//!
//! - [`DocumentRepository`] - Document collections behind the API route groups
//! - [`RateLimitStore`] - Fixed-window counters used by the rate limiter
//!
//! Mock implementations are generated via `mockall` for unit tests.

pub mod document_repository;
pub mod rate_limit_store;

pub use document_repository::{Document, DocumentRepository};
pub use rate_limit_store::{RateLimitStore, RateLimitStoreError};

#[cfg(test)]
pub use document_repository::MockDocumentRepository;
#[cfg(test)]
pub use rate_limit_store::MockRateLimitStore;
