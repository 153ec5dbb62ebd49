//! AI estimation strategy.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::instrument;

use super::Resolver;
use crate::providers::StructuredGenerator;
use crate::types::{
    EventSink, ExtractedFoodItem, GenerateOptions, MacroEstimate, Message, NutrientSource,
    OutputSchema, ResolutionEvent, ResolvedNutrientProfile,
};
use crate::{PlatewiseError, Result};

/// Default model for numeric estimates.
pub const DEFAULT_ESTIMATOR_MODEL: &str = "gpt-4o";

/// Asks a structured-generation model for calories and macros of the stated
/// quantity. The profile keeps the item's own name and quantity.
pub struct EstimationResolver {
    generator: Arc<dyn StructuredGenerator>,
    options: GenerateOptions,
}

impl EstimationResolver {
    pub fn new(generator: Arc<dyn StructuredGenerator>) -> Self {
        Self {
            generator,
            options: GenerateOptions::default().model(DEFAULT_ESTIMATOR_MODEL),
        }
    }

    /// Replace the generation options (model, temperature, ...).
    pub fn options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    async fn estimate(&self, item: &ExtractedFoodItem) -> Result<MacroEstimate> {
        let messages = [Message::user(estimation_prompt(item))];
        let value = self
            .generator
            .generate_structured(&messages, &estimate_schema(), &self.options)
            .await?;

        let estimate: MacroEstimate = serde_json::from_value(value)
            .map_err(|e| PlatewiseError::EstimationFailed(format!("schema mismatch: {e}")))?;
        if !estimate.is_finite() {
            return Err(PlatewiseError::EstimationFailed(
                "non-finite value in estimate".into(),
            ));
        }
        Ok(estimate)
    }
}

#[async_trait]
impl Resolver for EstimationResolver {
    fn name(&self) -> &str {
        "ai_estimate"
    }

    #[instrument(skip_all, fields(food_name = %item.food_name, generator = self.generator.name()))]
    async fn resolve(
        &self,
        item: &ExtractedFoodItem,
        events: &dyn EventSink,
    ) -> Result<ResolvedNutrientProfile> {
        events.emit(ResolutionEvent::EstimationAttempted {
            food_name: item.food_name.clone(),
            quantity: item.quantity.clone(),
        });

        match self.estimate(item).await {
            Ok(estimate) => Ok(ResolvedNutrientProfile::new(
                item.food_name.clone(),
                item.quantity.clone(),
                &estimate,
                NutrientSource::AiEstimate,
            )),
            Err(e) => {
                events.emit(ResolutionEvent::EstimationFailed {
                    food_name: item.food_name.clone(),
                    reason: e.to_string(),
                });
                Err(match e {
                    PlatewiseError::EstimationFailed(_) => e,
                    other => PlatewiseError::EstimationFailed(other.to_string()),
                })
            }
        }
    }
}

fn estimation_prompt(item: &ExtractedFoodItem) -> String {
    let quantity = if item.quantity.trim().is_empty() {
        "1 serving"
    } else {
        item.quantity.as_str()
    };
    format!(
        "Estimate the nutritional content for: {quantity} of {name}\n\n\
         Provide realistic estimates based on typical nutritional values for this food. \
         Return the values for the specified quantity, not per 100g.\n\n\
         Be accurate and use your knowledge of food nutrition.",
        name = item.food_name,
    )
}

fn estimate_schema() -> OutputSchema {
    OutputSchema::new(
        "nutrient_estimate",
        json!({
            "type": "object",
            "properties": {
                "calories": {"type": "number", "description": "Estimated calories in kcal"},
                "protein": {"type": "number", "description": "Estimated protein in grams"},
                "carbs": {"type": "number", "description": "Estimated carbohydrates in grams"},
                "fat": {"type": "number", "description": "Estimated fat in grams"}
            },
            "required": ["calories", "protein", "carbs", "fat"],
            "additionalProperties": false
        }),
    )
}
