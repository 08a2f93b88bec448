#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use booking_gateway::domain::repositories::Document;
use booking_gateway::prelude::*;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use std::sync::Arc;

pub const CLIENT_IP: &str = "203.0.113.10";

pub static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

pub fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

/// Production defaults with the client identity taken from `X-Forwarded-For`.
pub fn test_config(environment: Environment) -> Config {
    Config {
        environment,
        behind_proxy: true,
        ..Config::default()
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub clock: Arc<ManualClock>,
}

pub fn build_router(
    config: &Config,
    documents: Arc<dyn DocumentRepository>,
    clock: Arc<ManualClock>,
) -> Router {
    let pipeline = Arc::new(Pipeline::standard(
        config,
        Arc::new(MemoryRateLimitStore::new()),
        clock,
    ));
    service_router(AppState::new(documents), pipeline, "public")
}

pub fn spawn_app_with(config: Config, documents: Arc<dyn DocumentRepository>) -> TestApp {
    let clock = Arc::new(ManualClock::new(t0()));
    let router = build_router(&config, documents, clock.clone());

    TestApp {
        server: TestServer::new(router).unwrap(),
        clock,
    }
}

pub fn spawn_app(environment: Environment) -> TestApp {
    spawn_app_with(
        test_config(environment),
        Arc::new(MemoryDocumentRepository::default()),
    )
}

pub fn ip(addr: &str) -> HeaderValue {
    HeaderValue::from_str(addr).unwrap()
}

pub fn forest_hiker() -> Value {
    json!({
        "name": "The Forest Hiker",
        "duration": 5,
        "maxGroupSize": 25,
        "difficulty": "easy",
        "price": 397,
        "summary": "Breathtaking hike through the Canadian Banff National Park"
    })
}

pub fn sea_explorer() -> Value {
    json!({
        "name": "The Sea Explorer",
        "duration": 7,
        "maxGroupSize": 15,
        "difficulty": "medium",
        "price": 497
    })
}

/// Repository whose every call fails with an unclassified driver error.
pub struct FailingRepository;

fn driver_error() -> PersistenceError {
    PersistenceError::Driver("connection reset by peer".to_string())
}

#[async_trait]
impl DocumentRepository for FailingRepository {
    async fn find(
        &self,
        _collection: &str,
        _filter: &Map<String, Value>,
    ) -> Result<Vec<Document>, PersistenceError> {
        Err(driver_error())
    }

    async fn find_by_id(
        &self,
        _collection: &str,
        _id: &str,
    ) -> Result<Option<Document>, PersistenceError> {
        Err(driver_error())
    }

    async fn insert(&self, _collection: &str, _fields: Document) -> Result<Document, PersistenceError> {
        Err(driver_error())
    }

    async fn update(
        &self,
        _collection: &str,
        _id: &str,
        _fields: Document,
    ) -> Result<Option<Document>, PersistenceError> {
        Err(driver_error())
    }

    async fn delete(&self, _collection: &str, _id: &str) -> Result<bool, PersistenceError> {
        Err(driver_error())
    }
}

/// Repository that panics on reads, standing in for a handler bug.
pub struct PanickingRepository;

#[async_trait]
impl DocumentRepository for PanickingRepository {
    async fn find(
        &self,
        _collection: &str,
        _filter: &Map<String, Value>,
    ) -> Result<Vec<Document>, PersistenceError> {
        panic!("index out of bounds: the len is 0 but the index is 3")
    }

    async fn find_by_id(
        &self,
        _collection: &str,
        _id: &str,
    ) -> Result<Option<Document>, PersistenceError> {
        panic!("index out of bounds: the len is 0 but the index is 3")
    }

    async fn insert(&self, _collection: &str, _fields: Document) -> Result<Document, PersistenceError> {
        Err(driver_error())
    }

    async fn update(
        &self,
        _collection: &str,
        _id: &str,
        _fields: Document,
    ) -> Result<Option<Document>, PersistenceError> {
        Err(driver_error())
    }

    async fn delete(&self, _collection: &str, _id: &str) -> Result<bool, PersistenceError> {
        Err(driver_error())
    }
}
