//! Error responses.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

use crate::PlatewiseError;

/// Message for a photo in which nothing could be identified.
pub const NO_FOOD_MESSAGE: &str = "Could not identify food in image";

/// An HTTP error rendered as `{ "error": message }`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<PlatewiseError> for ApiError {
    fn from(err: PlatewiseError) -> Self {
        match err {
            PlatewiseError::InvalidInput(message) => {
                warn!(%message, "rejected request");
                Self::bad_request(message)
            }
            PlatewiseError::NoFoodIdentified => Self::bad_request(NO_FOOD_MESSAGE),
            other => {
                error!(error = %other, "food analysis failed");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: format!("Failed to analyze food image: {other}"),
                }
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(reason = %rejection.body_text(), "rejected request body");
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
