//! USDA FoodData Central search client.
//!
//! Uses the `POST /foods/search` endpoint, which returns abridged food
//! records with their nutrient lists inline, so one request is enough to
//! score candidates. See: <https://fdc.nal.usda.gov/api-guide.html>
//!
//! The API is free but the response shape varies by data tier: branded
//! records often omit nutrients, some entries carry no value, and new tier
//! labels appear over time. Decoding is therefore per-record and lenient: a
//! record that fails to decode is skipped instead of failing the search.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::handle_response_errors;
use super::traits::NutritionDatabase;
use crate::telemetry;
use crate::types::{DataType, Nutrient, NutrientCandidate};
use crate::{PlatewiseError, Result};

/// Default base URL for the FoodData Central API
pub const DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";

/// Largest page size the API accepts.
const MAX_PAGE_SIZE: u32 = 200;

/// Client for the USDA FoodData Central API.
#[derive(Clone)]
pub struct UsdaClient {
    api_key: String,
    http: Client,
    base_url: String,
    data_types: Vec<DataType>,
    timeout: Duration,
}

impl UsdaClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::with_http_client(api_key, base_url, Client::new())
    }

    /// Create a client sharing an existing connection pool.
    pub fn with_http_client(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        http: Client,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            data_types: DataType::SEARCHABLE.to_vec(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Restrict searches to the given data tiers.
    pub fn data_types(mut self, data_types: Vec<DataType>) -> Self {
        self.data_types = data_types;
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Search foods by free-text query.
    ///
    /// # Arguments
    /// * `query` - Food name, e.g. `"chicken breast fried"`
    /// * `page_size` - Number of candidates to request (1-200)
    #[instrument(skip(self), fields(provider = "usda"))]
    pub async fn search(&self, query: &str, page_size: u32) -> Result<Vec<NutrientCandidate>> {
        if query.trim().is_empty() {
            return Err(PlatewiseError::InvalidInput(
                "search query cannot be empty".into(),
            ));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(PlatewiseError::InvalidInput(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let start = Instant::now();
        let result = self.send_search(query, page_size).await;
        telemetry::record_request("usda", "search_foods", start, result.is_ok());
        result
    }

    async fn send_search(&self, query: &str, page_size: u32) -> Result<Vec<NutrientCandidate>> {
        let url = format!("{}/foods/search", self.base_url);
        let data_types: Vec<&str> = self.data_types.iter().map(DataType::label).collect();

        let response = self
            .http
            .post(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .timeout(self.timeout)
            .json(&SearchRequest {
                query,
                page_size,
                data_type: data_types,
            })
            .send()
            .await
            .map_err(|e| PlatewiseError::Http(e.to_string()))?;

        let response = handle_response_errors(response, "USDA").await?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| PlatewiseError::MalformedResponse(e.to_string()))?;

        let raw = body.foods.unwrap_or_default();
        let total = raw.len();
        let candidates: Vec<NutrientCandidate> = raw
            .into_iter()
            .filter_map(|value| serde_json::from_value::<UsdaFood>(value).ok())
            .map(UsdaFood::into_candidate)
            .collect();

        if candidates.len() < total {
            debug!(
                query,
                skipped = total - candidates.len(),
                "skipped undecodable food records"
            );
        }

        Ok(candidates)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    page_size: u32,
    data_type: Vec<&'a str>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Option<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsdaFood {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    data_type: Option<String>,
    #[serde(default)]
    food_nutrients: Option<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsdaNutrient {
    #[serde(default)]
    nutrient_name: Option<String>,
    #[serde(default)]
    value: Option<serde_json::Value>,
    #[serde(default)]
    unit_name: Option<String>,
}

impl UsdaFood {
    fn into_candidate(self) -> NutrientCandidate {
        let nutrients = self
            .food_nutrients
            .unwrap_or_default()
            .into_iter()
            .filter_map(|value| serde_json::from_value::<UsdaNutrient>(value).ok())
            .filter_map(|n| {
                Some(Nutrient {
                    name: n.nutrient_name?,
                    value: n.value?.as_f64()?,
                    unit: n.unit_name.unwrap_or_default(),
                })
            })
            .collect();

        NutrientCandidate {
            description: self.description.unwrap_or_default(),
            data_type: self
                .data_type
                .as_deref()
                .map(DataType::from_label)
                .unwrap_or(DataType::Unknown),
            nutrients,
        }
    }
}

// ============================================================================
// Provider Trait Implementation
// ============================================================================

#[async_trait]
impl NutritionDatabase for UsdaClient {
    fn name(&self) -> &str {
        "usda"
    }

    async fn search_foods(&self, query: &str, page_size: u32) -> Result<Vec<NutrientCandidate>> {
        UsdaClient::search(self, query, page_size).await
    }
}
