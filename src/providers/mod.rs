//! Outbound collaborators: structured-generation models and the nutrition
//! database, plus the retry decorator.

pub mod openai;
pub mod retry;
pub mod traits;
pub mod usda;

use std::time::Duration;

pub use openai::OpenAiClient;
pub use retry::{RetryConfig, RetryingGenerator};
pub use traits::{NutritionDatabase, StructuredGenerator};
pub use usda::UsdaClient;

use crate::{PlatewiseError, Result};

/// Map non-success HTTP statuses to errors, passing successful responses on.
pub(crate) async fn handle_response_errors(
    response: reqwest::Response,
    vendor: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        401 | 403 => Err(PlatewiseError::AuthenticationFailed),
        429 => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            Err(PlatewiseError::RateLimited { retry_after })
        }
        code => {
            let body = response.text().await.unwrap_or_default();
            Err(PlatewiseError::Api {
                status: code,
                message: format!("{vendor} API error: {}", truncate(&body, 200)),
            })
        }
    }
}

/// Cut `s` to at most `max` characters.
pub(crate) fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
