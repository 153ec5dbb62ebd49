//! Platewise - nutrient estimation from food photos
//!
//! A photo goes through one vision call that names each visible food item
//! and estimates its quantity. Every item is then resolved independently
//! and concurrently: the USDA FoodData Central database is searched and the
//! best-scoring record wins; when the database has nothing usable, a model
//! estimates the nutrients instead. The result is one profile per item, in
//! extraction order, plus meal totals.
//!
//! # Example
//!
//! ```rust,no_run
//! use platewise::{ImageInput, Platewise};
//!
//! #[tokio::main]
//! async fn main() -> platewise::Result<()> {
//!     let analyzer = Platewise::builder()
//!         .openai("sk-your-key")
//!         .usda("your-fdc-key")
//!         .build()?;
//!
//!     let bytes = std::fs::read("lunch.jpg").expect("readable image");
//!     let image = ImageInput::from_bytes(&bytes)?;
//!     let meal = analyzer.analyze_meal(&image).await?;
//!
//!     for food in &meal.foods {
//!         println!("{} ({}): {} kcal", food.food_name, food.quantity, food.calories);
//!     }
//!     println!("total: {} kcal", meal.totals.calories);
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod cache;
#[cfg(feature = "config")]
pub mod config;
pub mod error;
pub mod providers;
pub mod resolve;
#[cfg(feature = "server")]
pub mod server;
pub mod telemetry;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use analyzer::{FoodAnalyzer, Platewise, PlatewiseBuilder, VisionExtractor};
pub use cache::{CacheConfig, LookupCache};
pub use error::{PlatewiseError, Result};
pub use version::{PKG_VERSION, version_string};
pub use providers::{
    NutritionDatabase, OpenAiClient, RetryConfig, RetryingGenerator, StructuredGenerator,
    UsdaClient,
};
pub use resolve::{
    CachingResolver, DatabaseResolver, EstimationResolver, Resolver, ResolverChain,
};

// Re-export all types
pub use types::{
    ContentPart, DataType, EventSink, ExtractedFoodItem, GenerateOptions, ImageInput,
    MacroEstimate, MealAnalysis, MealTotals, Message, MessageContent, Nutrient,
    NutrientCandidate, NutrientSource, OutputSchema, RecordingSink, ResolutionEvent,
    ResolvedNutrientProfile, Role, TracingSink,
};
