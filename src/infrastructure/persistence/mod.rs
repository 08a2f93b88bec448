//! Repository implementations.
//!
//! - [`MemoryDocumentRepository`] - In-process document collections with id,
//!   required-field and unique-field checks

mod memory_document_repository;

pub use memory_document_repository::{CollectionSchema, DEFAULT_SCHEMAS, MemoryDocumentRepository};
