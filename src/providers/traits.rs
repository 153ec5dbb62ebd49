//! Collaborator traits for the outbound services the pipeline depends on.
//!
//! The pipeline talks to exactly two kinds of external service:
//! - a structured-generation model ([`StructuredGenerator`]) used for both
//!   vision extraction and the numeric estimator
//! - a nutrition database ([`NutritionDatabase`]) searched by food name
//!
//! Both are capability interfaces rather than vendor bindings, so decorators
//! (`RetryingGenerator`) and test doubles slot in without touching the
//! pipeline.

use async_trait::async_trait;

use crate::Result;
use crate::types::{GenerateOptions, Message, NutrientCandidate, OutputSchema};

// ============================================================================
// Structured generation
// ============================================================================

/// A model that answers a prompt with JSON conforming to a declared schema.
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Run one generation call and return the parsed JSON output.
    ///
    /// Messages may be multimodal (image + text) or text-only. The returned
    /// value is whatever the model produced; callers validate it against
    /// their own types.
    async fn generate_structured(
        &self,
        messages: &[Message],
        schema: &OutputSchema,
        options: &GenerateOptions,
    ) -> Result<serde_json::Value>;
}

// ============================================================================
// Nutrition database
// ============================================================================

/// Free-text food search returning candidate nutrition records.
#[async_trait]
pub trait NutritionDatabase: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Search by food name, returning at most `page_size` candidates in the
    /// database's own ranking order.
    async fn search_foods(&self, query: &str, page_size: u32) -> Result<Vec<NutrientCandidate>>;
}
