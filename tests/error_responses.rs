mod common;

use axum::http::StatusCode;
use booking_gateway::prelude::*;
use common::{FailingRepository, X_FORWARDED_FOR, ip};
use serde_json::{Value, json};
use std::sync::Arc;

const MISSING_ID: &str = "5c88fa8cf4afda39709c2951";

#[tokio::test]
async fn test_unknown_api_route_production() {
    let app = common::spawn_app(Environment::Production);

    let response = app
        .server
        .get("/api/v1/nope?x=1")
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<Value>(),
        json!({"status": "fail", "message": "Can't find /api/v1/nope?x=1 on this server!"})
    );
}

#[tokio::test]
async fn test_unknown_api_route_development_includes_stack() {
    let app = common::spawn_app(Environment::Development);

    let response = app
        .server
        .get("/api/v1/nope")
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "fail");
    assert_eq!(body["message"], "Can't find /api/v1/nope on this server!");
    assert_eq!(body["error"]["statusCode"], 404);
    assert_eq!(body["error"]["isOperational"], true);
    assert!(body["stack"].is_string());
}

#[tokio::test]
async fn test_unsupported_method_is_not_found() {
    let app = common::spawn_app(Environment::Production);

    let response = app
        .server
        .put("/api/v1/tours")
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<Value>()["message"],
        "Can't find /api/v1/tours on this server!"
    );
}

#[tokio::test]
async fn test_unknown_page_renders_error_page() {
    let app = common::spawn_app(Environment::Production);

    let response = app
        .server
        .get("/nope")
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let html = response.text();
    assert!(html.contains("Something went wrong!"));
    assert!(html.contains("find /nope on this server!"));
}

#[tokio::test]
async fn test_malformed_id_is_bad_request() {
    let app = common::spawn_app(Environment::Production);

    let response = app
        .server
        .get("/api/v1/tours/not-an-id")
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({"status": "fail", "message": "Invalid _id: not-an-id."})
    );
}

#[tokio::test]
async fn test_duplicate_key_is_bad_request() {
    let app = common::spawn_app(Environment::Production);

    app.server
        .post("/api/v1/tours")
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .json(&common::forest_hiker())
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .post("/api/v1/tours")
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .json(&common::forest_hiker())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["message"],
        "Duplicate field value: \"The Forest Hiker\". Please use another value!"
    );
}

#[tokio::test]
async fn test_validation_failure_is_bad_request() {
    let app = common::spawn_app(Environment::Production);

    let response = app
        .server
        .post("/api/v1/tours")
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .json(&json!({"name": "Nameless"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "fail");
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Invalid input data. "));
    assert!(message.contains("A tour must have a price"));
    assert!(!message.contains("A tour must have a name"));
}

#[tokio::test]
async fn test_missing_document_is_not_found() {
    let app = common::spawn_app(Environment::Production);

    let response = app
        .server
        .get(&format!("/api/v1/bookings/{MISSING_ID}"))
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<Value>()["message"],
        "No document found with that ID"
    );
}

#[tokio::test]
async fn test_unclassified_failure_is_generic_in_production() {
    let app = common::spawn_app_with(
        common::test_config(Environment::Production),
        Arc::new(FailingRepository),
    );

    let response = app
        .server
        .get("/api/v1/tours")
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>(),
        json!({"status": "error", "message": "Something went wrong!"})
    );
}

#[tokio::test]
async fn test_unclassified_failure_is_detailed_in_development() {
    let app = common::spawn_app_with(
        common::test_config(Environment::Development),
        Arc::new(FailingRepository),
    );

    let response = app
        .server
        .get("/api/v1/tours")
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["isOperational"], false);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("connection reset by peer")
    );
    assert!(body["stack"].is_string());
}

#[tokio::test]
async fn test_page_failure_hides_detail_in_production() {
    let app = common::spawn_app_with(
        common::test_config(Environment::Production),
        Arc::new(FailingRepository),
    );

    let response = app
        .server
        .get("/")
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let html = response.text();
    assert!(html.contains("Please try again later."));
    assert!(!html.contains("connection reset"));
}

#[tokio::test]
async fn test_unknown_tour_page() {
    let app = common::spawn_app(Environment::Production);

    let response = app
        .server
        .get(&format!("/tour/{MISSING_ID}"))
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(response.text().contains("There is no tour with that name."));
}

#[tokio::test]
async fn test_production_errors_never_carry_stack() {
    let app = common::spawn_app(Environment::Production);

    let body = app
        .server
        .get("/api/v1/tours/not-an-id")
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .await
        .json::<Value>();

    assert!(body.get("stack").is_none());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_undecodable_id_is_normalized_for_api() {
    let app = common::spawn_app(Environment::Production);

    let response = app
        .server
        .get("/api/v1/tours/%FF")
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({"status": "fail", "message": "Invalid _id: %FF."})
    );
}

#[tokio::test]
async fn test_undecodable_id_renders_error_page() {
    let app = common::spawn_app(Environment::Production);

    let response = app
        .server
        .get("/tour/%C3%28")
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let html = response.text();
    assert!(html.contains("Something went wrong!"));
    assert!(html.contains("Invalid _id: %C3%28."));
    assert!(!html.contains("Invalid URL"));
}

#[tokio::test]
async fn test_handler_panic_is_generic_in_production() {
    let app = common::spawn_app_with(
        common::test_config(Environment::Production),
        Arc::new(common::PanickingRepository),
    );

    let response = app
        .server
        .get("/api/v1/tours")
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>(),
        json!({"status": "error", "message": "Something went wrong!"})
    );
    assert_eq!(response.header("cross-origin-resource-policy"), "cross-origin");
}

#[tokio::test]
async fn test_handler_panic_on_page_renders_fallback() {
    let app = common::spawn_app_with(
        common::test_config(Environment::Production),
        Arc::new(common::PanickingRepository),
    );

    let response = app
        .server
        .get("/")
        .add_header(X_FORWARDED_FOR.clone(), ip(common::CLIENT_IP))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let html = response.text();
    assert!(html.contains("Please try again later."));
    assert!(!html.contains("index out of bounds"));
}
