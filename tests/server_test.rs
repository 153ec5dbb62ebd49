//! HTTP endpoint tests, driven through the router without a socket.
#![cfg(feature = "server")]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use common::*;
use platewise::RecordingSink;
use platewise::config::LimitsConfig;
use platewise::server::{AppState, router};

fn app(generator: StubGenerator, database: StubDatabase) -> axum::Router {
    let (analyzer, _, _) = analyzer(generator, database, Arc::new(RecordingSink::new()));
    let limits = LimitsConfig::default();
    router(
        AppState::new(Arc::new(analyzer), limits.max_image_bytes),
        &limits,
    )
}

fn analyze_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/analyze-food")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn image_body() -> String {
    serde_json::json!({ "image": test_image().to_data_url() }).to_string()
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(StubGenerator::new(), StubDatabase::new()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].as_str().unwrap().contains(platewise::PKG_VERSION));
}

#[tokio::test]
async fn missing_image_is_400() {
    let (status, body) = send(
        app(StubGenerator::new(), StubDatabase::new()),
        analyze_request("{}"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No image provided");
}

#[tokio::test]
async fn empty_image_is_400() {
    let (status, body) = send(
        app(StubGenerator::new(), StubDatabase::new()),
        analyze_request(r#"{"image": ""}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No image provided");
}

#[tokio::test]
async fn undecodable_image_is_400() {
    let (status, body) = send(
        app(StubGenerator::new(), StubDatabase::new()),
        analyze_request(r#"{"image": "data:image/png;base64,***"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_json_is_400() {
    let (status, body) = send(
        app(StubGenerator::new(), StubDatabase::new()),
        analyze_request("{not json"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn nothing_identified_is_400() {
    let (status, body) = send(
        app(StubGenerator::new().items(&[]), StubDatabase::new()),
        analyze_request(image_body()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Could not identify food in image");
}

#[tokio::test]
async fn vision_failure_is_500() {
    let (status, body) = send(
        app(StubGenerator::new().vision_fails(), StubDatabase::new()),
        analyze_request(image_body()),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to analyze food image: ")
    );
}

#[tokio::test]
async fn analysis_returns_foods_and_totals() {
    let generator = StubGenerator::new()
        .items(&[("grilled salmon", "150g"), ("rice pilaf", "1 cup")])
        .estimate("rice pilaf", 240.0, 4.5, 41.0, 6.2);
    let database = StubDatabase::new().candidates(
        "grilled salmon",
        vec![full_record(
            "Fish, salmon, Atlantic, cooked",
            platewise::DataType::SrLegacy,
            206.0,
            22.1,
            0.0,
            12.35,
        )],
    );

    let (status, body) = send(app(generator, database), analyze_request(image_body())).await;

    assert_eq!(status, StatusCode::OK);
    let foods = body["foods"].as_array().unwrap();
    assert_eq!(foods.len(), 2);

    assert_eq!(foods[0]["foodName"], "Fish, salmon, Atlantic, cooked");
    assert_eq!(foods[0]["quantity"], "150g");
    assert_eq!(foods[0]["calories"], 206);
    assert_eq!(foods[0]["source"], "database");
    assert!(foods[0].get("error").is_none());

    assert_eq!(foods[1]["foodName"], "rice pilaf");
    assert_eq!(foods[1]["source"], "ai_estimate");
    assert_eq!(foods[1]["fat"], 6.2);

    assert_eq!(body["totals"]["calories"], 446);
    assert_eq!(body["totals"]["protein"], 26.6);
}

#[tokio::test]
async fn failed_item_is_still_200() {
    let generator = StubGenerator::new()
        .items(&[("mystery stew", "1 bowl")])
        .estimate_fails("mystery stew");

    let (status, body) = send(
        app(generator, StubDatabase::new()),
        analyze_request(image_body()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["foods"][0]["error"], "Failed to estimate");
    assert_eq!(body["foods"][0]["calories"], 0);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let request = Request::builder()
        .uri("/api/unknown")
        .body(Body::empty())
        .unwrap();
    let response = app(StubGenerator::new(), StubDatabase::new())
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
