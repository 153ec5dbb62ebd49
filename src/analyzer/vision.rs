//! Vision extraction: photo in, named food items with quantities out.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::providers::StructuredGenerator;
use crate::types::{ExtractedFoodItem, GenerateOptions, ImageInput, Message, OutputSchema};
use crate::{PlatewiseError, Result};

/// Default vision model.
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";

const VISION_PROMPT: &str = "Analyze this food image and identify all food items visible. \
For each distinct food item, provide:
1. The name of the food using simple, generic terms that would appear in a nutrition database \
(e.g., \"chicken breast fried\" instead of \"crispy fried chicken\", \"white rice\" instead of \
\"steamed jasmine rice\")
2. An estimated quantity with appropriate units (e.g., \"1 cup\", \"200g\", \"1 piece\", \"1 serving\")

Use simple food names without brand names or elaborate descriptions. \
List each distinct food item separately.";

/// Extracts food items from a photo with one structured-generation call.
#[derive(Clone)]
pub struct VisionExtractor {
    generator: Arc<dyn StructuredGenerator>,
    options: GenerateOptions,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisionOutput {
    food_items: Vec<ExtractedFoodItem>,
}

impl VisionExtractor {
    pub fn new(generator: Arc<dyn StructuredGenerator>) -> Self {
        Self {
            generator,
            options: GenerateOptions::default().model(DEFAULT_VISION_MODEL),
        }
    }

    pub fn options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Identify the food items in `image`, in the order the model lists them.
    ///
    /// An empty list is a valid result. Any generation failure or output that
    /// does not match the schema is a [`PlatewiseError::VisionExtraction`];
    /// nothing is salvaged from a partial answer.
    #[instrument(skip_all, fields(generator = self.generator.name(), bytes = image.len()))]
    pub async fn extract(&self, image: &ImageInput) -> Result<Vec<ExtractedFoodItem>> {
        let messages = [Message::user_with_image(image, VISION_PROMPT)];
        let value = self
            .generator
            .generate_structured(&messages, &vision_schema(), &self.options)
            .await
            .map_err(|e| PlatewiseError::VisionExtraction(e.to_string()))?;

        let output: VisionOutput = serde_json::from_value(value)
            .map_err(|e| PlatewiseError::VisionExtraction(format!("schema mismatch: {e}")))?;

        Ok(output
            .food_items
            .into_iter()
            .filter_map(|item| {
                let food_name = item.food_name.trim();
                (!food_name.is_empty())
                    .then(|| ExtractedFoodItem::new(food_name, item.quantity.trim()))
            })
            .collect())
    }
}

fn vision_schema() -> OutputSchema {
    OutputSchema::new(
        "food_items",
        json!({
            "type": "object",
            "properties": {
                "foodItems": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "foodName": {
                                "type": "string",
                                "description": "The name of the food item"
                            },
                            "quantity": {
                                "type": "string",
                                "description": "Estimated quantity with unit (e.g., \"1 cup\", \"200g\", \"1 piece\")"
                            }
                        },
                        "required": ["foodName", "quantity"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["foodItems"],
            "additionalProperties": false
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_asks_for_generic_names() {
        assert!(VISION_PROMPT.contains("\"white rice\" instead of \"steamed jasmine rice\""));
        assert!(VISION_PROMPT.contains("without brand names"));
    }

    #[test]
    fn schema_declares_food_items() {
        let schema = vision_schema();
        assert_eq!(
            schema.schema["properties"]["foodItems"]["items"]["required"],
            json!(["foodName", "quantity"])
        );
    }
}
