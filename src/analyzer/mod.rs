//! The food-photo analysis pipeline.
//!
//! [`FoodAnalyzer`] runs vision extraction once, then resolves every
//! extracted item concurrently through the [`ResolverChain`] and returns
//! the profiles in extraction order. Build one with [`Platewise::builder()`].

mod builder;
pub mod vision;

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::instrument;

pub use builder::{Platewise, PlatewiseBuilder};
pub use vision::VisionExtractor;

use crate::cache::LookupCache;
use crate::resolve::ResolverChain;
use crate::types::{
    EventSink, ExtractedFoodItem, ImageInput, MealAnalysis, ResolutionEvent,
    ResolvedNutrientProfile,
};
use crate::{PlatewiseError, Result};

/// Vision extraction plus per-item resolution.
///
/// Cheap to share: hold it in an `Arc` and call from many tasks.
pub struct FoodAnalyzer {
    vision: VisionExtractor,
    chain: ResolverChain,
    events: Arc<dyn EventSink>,
    lookup_cache: Option<LookupCache>,
}

impl FoodAnalyzer {
    /// Assemble an analyzer from its parts.
    ///
    /// Most callers want [`Platewise::builder()`] instead.
    pub fn new(vision: VisionExtractor, chain: ResolverChain, events: Arc<dyn EventSink>) -> Self {
        Self {
            vision,
            chain,
            events,
            lookup_cache: None,
        }
    }

    pub(crate) fn with_lookup_cache(mut self, cache: LookupCache) -> Self {
        self.lookup_cache = Some(cache);
        self
    }

    /// Extract items from the photo and resolve each one.
    ///
    /// Fails only when extraction fails or finds nothing; per-item problems
    /// are reported on the item's profile.
    #[instrument(skip_all)]
    pub async fn analyze(&self, image: &ImageInput) -> Result<Vec<ResolvedNutrientProfile>> {
        let items = self.extract(image).await?;
        if items.is_empty() {
            return Err(PlatewiseError::NoFoodIdentified);
        }
        Ok(self.resolve_items(&items).await)
    }

    /// [`analyze()`](Self::analyze) plus meal totals.
    pub async fn analyze_meal(&self, image: &ImageInput) -> Result<MealAnalysis> {
        self.analyze(image).await.map(MealAnalysis::new)
    }

    /// Run vision extraction alone.
    pub async fn extract(&self, image: &ImageInput) -> Result<Vec<ExtractedFoodItem>> {
        let items = self.vision.extract(image).await?;
        self.events
            .emit(ResolutionEvent::ExtractionCompleted { items: items.len() });
        Ok(items)
    }

    /// Resolve items concurrently. Output matches input in length and order.
    pub async fn resolve_items(&self, items: &[ExtractedFoodItem]) -> Vec<ResolvedNutrientProfile> {
        let events = self.events.as_ref();
        join_all(items.iter().map(|item| self.chain.resolve(item, events))).await
    }

    /// Resolve a single item. Never fails.
    pub async fn resolve_item(&self, item: &ExtractedFoodItem) -> ResolvedNutrientProfile {
        self.chain.resolve(item, self.events.as_ref()).await
    }

    /// Strategy names in fallback order.
    pub fn strategies(&self) -> Vec<&str> {
        self.chain.names()
    }

    /// The lookup cache, when enabled.
    pub fn lookup_cache(&self) -> Option<&LookupCache> {
        self.lookup_cache.as_ref()
    }
}
