//! Request handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use super::{ApiError, AppState};
use crate::types::{ImageInput, MealAnalysis};
use crate::version;

/// Body of `POST /api/analyze-food`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Base64 image, as a `data:` URL or bare payload.
    #[serde(default)]
    pub image: Option<String>,
}

/// `POST /api/analyze-food`
#[instrument(skip_all)]
pub async fn analyze_food(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<MealAnalysis>, ApiError> {
    let Json(request) = payload?;
    let image = ImageInput::from_data_url(
        request.image.as_deref().unwrap_or_default(),
        state.max_image_bytes,
    )?;
    let meal = state.analyzer.analyze_meal(&image).await?;
    Ok(Json(meal))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": version::version_string(),
    }))
}
