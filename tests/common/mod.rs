//! In-memory collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use platewise::providers::{NutritionDatabase, StructuredGenerator};
use platewise::{
    DataType, EventSink, FoodAnalyzer, GenerateOptions, ImageInput, Message, NutrientCandidate,
    OutputSchema, Platewise, PlatewiseError, Result,
};

pub const ENERGY: &str = "Energy";
pub const PROTEIN: &str = "Protein";
pub const CARBS: &str = "Carbohydrate, by difference";
pub const FAT: &str = "Total lipid (fat)";

/// What a stub returns for one call.
#[derive(Clone)]
pub enum Reply<T> {
    Ok(T),
    Fail,
}

// ============================================================================
// Generator
// ============================================================================

/// Answers the vision schema with a fixed item list and the estimate schema
/// per food name.
#[derive(Default)]
pub struct StubGenerator {
    vision: Option<Reply<serde_json::Value>>,
    estimates: HashMap<String, Reply<serde_json::Value>>,
    pub vision_calls: AtomicUsize,
    pub estimate_calls: AtomicUsize,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vision returns these `(foodName, quantity)` pairs.
    pub fn items(mut self, items: &[(&str, &str)]) -> Self {
        let items: Vec<_> = items
            .iter()
            .map(|(name, quantity)| serde_json::json!({"foodName": name, "quantity": quantity}))
            .collect();
        self.vision = Some(Reply::Ok(serde_json::json!({ "foodItems": items })));
        self
    }

    /// Vision returns this raw JSON.
    pub fn vision_json(mut self, value: serde_json::Value) -> Self {
        self.vision = Some(Reply::Ok(value));
        self
    }

    pub fn vision_fails(mut self) -> Self {
        self.vision = Some(Reply::Fail);
        self
    }

    /// Estimator answers for `food_name`.
    pub fn estimate(
        mut self,
        food_name: &str,
        calories: f64,
        protein: f64,
        carbs: f64,
        fat: f64,
    ) -> Self {
        self.estimates.insert(
            food_name.to_string(),
            Reply::Ok(serde_json::json!({
                "calories": calories, "protein": protein, "carbs": carbs, "fat": fat
            })),
        );
        self
    }

    /// Estimator answers `food_name` with raw JSON.
    pub fn estimate_json(mut self, food_name: &str, value: serde_json::Value) -> Self {
        self.estimates.insert(food_name.to_string(), Reply::Ok(value));
        self
    }

    pub fn estimate_fails(mut self, food_name: &str) -> Self {
        self.estimates.insert(food_name.to_string(), Reply::Fail);
        self
    }

    pub fn estimates_made(&self) -> usize {
        self.estimate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StructuredGenerator for StubGenerator {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate_structured(
        &self,
        messages: &[Message],
        schema: &OutputSchema,
        _options: &GenerateOptions,
    ) -> Result<serde_json::Value> {
        let reply = if schema.name == "food_items" {
            self.vision_calls.fetch_add(1, Ordering::SeqCst);
            self.vision.clone()
        } else {
            self.estimate_calls.fetch_add(1, Ordering::SeqCst);
            let prompt = messages
                .iter()
                .map(|m| m.content.text())
                .collect::<Vec<_>>()
                .join("\n");
            self.estimates
                .iter()
                .find(|(name, _)| prompt.contains(&format!(" of {name}\n")))
                .map(|(_, reply)| reply.clone())
        };

        match reply {
            Some(Reply::Ok(value)) => Ok(value),
            Some(Reply::Fail) => Err(PlatewiseError::Http("connection reset".into())),
            None => Err(PlatewiseError::EmptyResponse),
        }
    }
}

// ============================================================================
// Database
// ============================================================================

/// Returns canned candidates per query, optionally after a delay.
#[derive(Default)]
pub struct StubDatabase {
    results: HashMap<String, Reply<Vec<NutrientCandidate>>>,
    delays: HashMap<String, Duration>,
    pub calls: AtomicUsize,
}

impl StubDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidates(mut self, query: &str, candidates: Vec<NutrientCandidate>) -> Self {
        self.results.insert(query.to_string(), Reply::Ok(candidates));
        self
    }

    pub fn fails(mut self, query: &str) -> Self {
        self.results.insert(query.to_string(), Reply::Fail);
        self
    }

    pub fn delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    pub fn calls_made(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NutritionDatabase for StubDatabase {
    fn name(&self) -> &str {
        "stub-db"
    }

    async fn search_foods(&self, query: &str, _page_size: u32) -> Result<Vec<NutrientCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        match self.results.get(query) {
            Some(Reply::Ok(candidates)) => Ok(candidates.clone()),
            Some(Reply::Fail) => Err(PlatewiseError::Http("network unreachable".into())),
            None => Ok(Vec::new()),
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// A record listing all four target nutrients.
pub fn full_record(
    description: &str,
    data_type: DataType,
    kcal: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
) -> NutrientCandidate {
    NutrientCandidate::new(description, data_type)
        .with_nutrient(ENERGY, kcal, "KCAL")
        .with_nutrient(PROTEIN, protein, "G")
        .with_nutrient(CARBS, carbs, "G")
        .with_nutrient(FAT, fat, "G")
}

/// Smallest valid PNG signature, enough for the pipeline.
pub fn test_image() -> ImageInput {
    ImageInput::from_bytes(b"\x89PNG\r\n\x1a\nrest-of-image").expect("valid image")
}

pub fn analyzer(
    generator: StubGenerator,
    database: StubDatabase,
    events: Arc<dyn EventSink>,
) -> (FoodAnalyzer, Arc<StubGenerator>, Arc<StubDatabase>) {
    let generator = Arc::new(generator);
    let database = Arc::new(database);
    let analyzer = Platewise::builder()
        .generator(generator.clone())
        .database(database.clone())
        .event_sink(events)
        .build()
        .expect("analyzer builds");
    (analyzer, generator, database)
}
