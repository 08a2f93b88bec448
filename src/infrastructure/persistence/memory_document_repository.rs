//! In-process document repository.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::repositories::{Document, DocumentRepository};
use crate::error::{FieldViolation, PersistenceError};

/// Length of a document id in hex characters.
const ID_HEX_LEN: usize = 24;

/// Integrity rules for one collection.
#[derive(Debug, Clone, Copy)]
pub struct CollectionSchema {
    pub name: &'static str,
    /// Used in validation messages, e.g. "A tour must have a price".
    pub singular: &'static str,
    pub required: &'static [&'static str],
    pub unique: &'static [&'static str],
}

/// Schemas for the collections served by the API route groups.
pub const DEFAULT_SCHEMAS: &[CollectionSchema] = &[
    CollectionSchema {
        name: "tours",
        singular: "tour",
        required: &["name", "duration", "maxGroupSize", "difficulty", "price"],
        unique: &["name"],
    },
    CollectionSchema {
        name: "users",
        singular: "user",
        required: &["name", "email"],
        unique: &["email"],
    },
    CollectionSchema {
        name: "reviews",
        singular: "review",
        required: &["review", "tour", "user"],
        unique: &[],
    },
    CollectionSchema {
        name: "bookings",
        singular: "booking",
        required: &["tour", "user", "price"],
        unique: &[],
    },
];

/// Document collections kept in memory.
///
/// Behaves like a document database driver from the caller's point of view:
/// ids are 24 hex characters, malformed ids, missing required fields and
/// duplicate unique values are reported as [`PersistenceError`]s.
pub struct MemoryDocumentRepository {
    schemas: Vec<CollectionSchema>,
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentRepository {
    pub fn new(schemas: &[CollectionSchema]) -> Self {
        debug!("Using in-memory document repository");
        Self {
            schemas: schemas.to_vec(),
            collections: RwLock::new(HashMap::new()),
        }
    }

    fn schema(&self, collection: &str) -> Result<&CollectionSchema, PersistenceError> {
        self.schemas
            .iter()
            .find(|s| s.name == collection)
            .ok_or_else(|| PersistenceError::Driver(format!("unknown collection '{collection}'")))
    }
}

impl Default for MemoryDocumentRepository {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMAS)
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn find(
        &self,
        collection: &str,
        filter: &Map<String, Value>,
    ) -> Result<Vec<Document>, PersistenceError> {
        self.schema(collection)?;
        let collections = self.collections.read().await;

        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| matches_filter(doc, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, PersistenceError> {
        self.schema(collection)?;
        check_id(id)?;
        let collections = self.collections.read().await;

        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc_id(doc) == Some(id)))
            .cloned())
    }

    async fn insert(&self, collection: &str, mut fields: Document) -> Result<Document, PersistenceError> {
        let schema = *self.schema(collection)?;
        check_required(&schema, &fields)?;

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        check_unique(&schema, docs, &fields, None)?;

        fields.insert("_id".to_string(), Value::String(generate_id()));
        docs.push(fields.clone());
        Ok(fields)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        mut fields: Document,
    ) -> Result<Option<Document>, PersistenceError> {
        let schema = *self.schema(collection)?;
        check_id(id)?;
        fields.remove("_id");

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        check_unique(&schema, docs, &fields, Some(id))?;

        let Some(doc) = docs.iter_mut().find(|doc| doc_id(doc) == Some(id)) else {
            return Ok(None);
        };

        let mut merged = doc.clone();
        merged.extend(fields);
        check_required(&schema, &merged)?;
        *doc = merged.clone();

        Ok(Some(merged))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, PersistenceError> {
        self.schema(collection)?;
        check_id(id)?;
        let mut collections = self.collections.write().await;

        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|doc| doc_id(doc) != Some(id));
        Ok(docs.len() != before)
    }
}

fn generate_id() -> String {
    let bytes: [u8; ID_HEX_LEN / 2] = rand::random();
    hex::encode(bytes)
}

fn doc_id(doc: &Document) -> Option<&str> {
    doc.get("_id").and_then(Value::as_str)
}

fn check_id(id: &str) -> Result<(), PersistenceError> {
    if id.len() == ID_HEX_LEN && id.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(PersistenceError::MalformedId {
            path: "_id".to_string(),
            value: id.to_string(),
        })
    }
}

fn check_required(schema: &CollectionSchema, fields: &Document) -> Result<(), PersistenceError> {
    let violations: Vec<FieldViolation> = schema
        .required
        .iter()
        .filter(|field| matches!(fields.get(**field), None | Some(Value::Null)))
        .map(|field| FieldViolation {
            field: field.to_string(),
            message: format!("A {} must have a {}", schema.singular, field),
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(PersistenceError::Validation { violations })
    }
}

fn check_unique(
    schema: &CollectionSchema,
    docs: &[Document],
    fields: &Document,
    except_id: Option<&str>,
) -> Result<(), PersistenceError> {
    for field in schema.unique {
        let Some(value) = fields.get(*field) else {
            continue;
        };
        let taken = docs
            .iter()
            .filter(|doc| except_id.is_none() || doc_id(doc) != except_id)
            .any(|doc| doc.get(*field) == Some(value));
        if taken {
            return Err(PersistenceError::DuplicateKey {
                field: field.to_string(),
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

fn matches_filter(doc: &Document, filter: &Map<String, Value>) -> bool {
    filter
        .iter()
        .all(|(field, expected)| matches_value(doc.get(field), expected))
}

fn matches_value(actual: Option<&Value>, expected: &Value) -> bool {
    match expected {
        Value::Array(options) => options.iter().any(|option| matches_value(actual, option)),
        Value::Object(ops) => ops.iter().all(|(op, bound)| {
            let (Some(actual), Some(bound)) = (actual.and_then(as_number), as_number(bound)) else {
                return false;
            };
            match op.as_str() {
                "gt" => actual > bound,
                "gte" => actual >= bound,
                "lt" => actual < bound,
                "lte" => actual <= bound,
                _ => false,
            }
        }),
        scalar => match (actual.and_then(as_number), as_number(scalar)) {
            (Some(a), Some(b)) => a == b,
            _ => actual.map(as_text) == Some(as_text(scalar)),
        },
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
