//! Repository trait for the document collections behind the route groups.

use crate::error::PersistenceError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A stored document. Always contains a string `_id`.
pub type Document = Map<String, Value>;

/// Repository interface for tours, users, reviews and bookings.
///
/// Implementations report driver-level failures as [`PersistenceError`]; handlers
/// propagate them with `?` and the error normalization layer classifies them.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::MemoryDocumentRepository`] - in-process store
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Lists documents of a collection matching `filter`.
    ///
    /// Filter values are matched as follows:
    /// - string / number: equality (numbers compared numerically)
    /// - list: any of the listed values
    /// - object with `gt`, `gte`, `lt`, `lte`: numeric range
    async fn find(
        &self,
        collection: &str,
        filter: &Map<String, Value>,
    ) -> Result<Vec<Document>, PersistenceError>;

    /// Finds one document by id.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::MalformedId`] if `id` is not a valid identifier.
    async fn find_by_id(&self, collection: &str, id: &str)
    -> Result<Option<Document>, PersistenceError>;

    /// Inserts a new document and returns it with its generated `_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Validation`] when required fields are missing and
    /// [`PersistenceError::DuplicateKey`] when a unique field is already taken.
    async fn insert(&self, collection: &str, fields: Document) -> Result<Document, PersistenceError>;

    /// Merges `fields` into an existing document.
    ///
    /// Returns `Ok(None)` if no document has this id.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> Result<Option<Document>, PersistenceError>;

    /// Deletes a document. Returns `Ok(false)` if it did not exist.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, PersistenceError>;
}
