//! HTTP front end for the analysis pipeline.
//!
//! Routes:
//! - `POST /api/analyze-food`: `{ image }` in, `{ foods, totals }` out
//! - `GET  /health`: liveness and build version
//!
//! Errors are always `{ "error": "..." }`: 400 for caller mistakes (missing
//! or undecodable image, nothing recognisable in the photo), 500 for
//! pipeline failures.

mod error;
pub mod service;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

pub use error::ApiError;

use crate::analyzer::FoodAnalyzer;
use crate::config::LimitsConfig;

/// Slack for the JSON envelope around the base64 image.
const BODY_OVERHEAD: usize = 64 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<FoodAnalyzer>,
    pub max_image_bytes: usize,
}

impl AppState {
    pub fn new(analyzer: Arc<FoodAnalyzer>, max_image_bytes: usize) -> Self {
        Self {
            analyzer,
            max_image_bytes,
        }
    }
}

/// Build the service router.
pub fn router(state: AppState, limits: &LimitsConfig) -> Router {
    // base64 inflates by 4/3
    let body_limit = state.max_image_bytes.saturating_mul(4) / 3 + BODY_OVERHEAD;

    Router::new()
        .route("/api/analyze-food", post(service::analyze_food))
        .route("/health", get(service::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(Duration::from_secs(
            limits.request_timeout_secs,
        )))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
