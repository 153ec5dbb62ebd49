//! Platewise error types

use std::time::Duration;

/// Platewise error types
#[derive(Debug, thiserror::Error)]
pub enum PlatewiseError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("empty response from model")]
    EmptyResponse,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Pipeline errors
    /// The vision call failed or produced output that does not match the
    /// declared schema. Fatal for the whole request.
    #[error("vision extraction failed: {0}")]
    VisionExtraction(String),

    #[error("could not identify food in image")]
    NoFoodIdentified,

    /// Database search returned no candidate records.
    #[error("no database candidates for '{0}'")]
    NoCandidates(String),

    /// Winning candidate carries no calorie value; treated as missing data.
    #[error("database record '{description}' has zero calories")]
    ZeroCalories { description: String },

    #[error("nutrient estimation failed: {0}")]
    EstimationFailed(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl PlatewiseError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Network failures, rate limits and 5xx responses are transient;
    /// everything else (auth, schema mismatches, bad input) is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            PlatewiseError::Http(_) | PlatewiseError::RateLimited { .. } => true,
            PlatewiseError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Server-provided retry hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            PlatewiseError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Whether the error is caused by the caller's input rather than by the
    /// pipeline or its collaborators.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PlatewiseError::InvalidInput(_) | PlatewiseError::NoFoodIdentified
        )
    }
}

impl From<reqwest::Error> for PlatewiseError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PlatewiseError::MalformedResponse(err.to_string())
        } else {
            PlatewiseError::Http(err.to_string())
        }
    }
}

/// Result type alias for Platewise operations
pub type Result<T> = std::result::Result<T, PlatewiseError>;
