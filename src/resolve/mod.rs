//! Per-item nutrient resolution.
//!
//! Each extracted item is resolved by a [`ResolverChain`]: an ordered list
//! of [`Resolver`] strategies tried in turn until one produces a profile.
//! The shipped chain is
//!
//! ```text
//! [CachingResolver(DatabaseResolver)]  ──fails──►  EstimationResolver
//!                                                        │ fails
//!                                                        ▼
//!                                          zero profile, error = "Failed to estimate"
//! ```
//!
//! Strategies report failure through `Err`; the chain turns every failure
//! into a fallback, so resolution as a whole never fails.

pub mod cached;
pub mod chain;
pub mod database;
pub mod estimate;
pub mod scoring;

use async_trait::async_trait;

pub use cached::CachingResolver;
pub use chain::ResolverChain;
pub use database::DatabaseResolver;
pub use estimate::EstimationResolver;

use crate::Result;
use crate::types::{EventSink, ExtractedFoodItem, ResolvedNutrientProfile};

/// One strategy for turning an extracted item into a nutrient profile.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Strategy name, used in fallback events and metrics.
    fn name(&self) -> &str;

    /// Resolve one item, reporting progress through `events`.
    async fn resolve(
        &self,
        item: &ExtractedFoodItem,
        events: &dyn EventSink,
    ) -> Result<ResolvedNutrientProfile>;
}
