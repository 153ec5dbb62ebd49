//! Cache decorator for resolver strategies.

use std::sync::Arc;

use async_trait::async_trait;

use super::Resolver;
use crate::Result;
use crate::cache::LookupCache;
use crate::types::{
    EventSink, ExtractedFoodItem, NutrientSource, ResolutionEvent, ResolvedNutrientProfile,
};

/// Serves repeated lookups from a [`LookupCache`] before delegating.
///
/// A hit skips the inner strategy entirely. Only successful database
/// profiles are stored.
pub struct CachingResolver {
    inner: Arc<dyn Resolver>,
    cache: LookupCache,
}

impl CachingResolver {
    pub fn new(inner: Arc<dyn Resolver>, cache: LookupCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }
}

#[async_trait]
impl Resolver for CachingResolver {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn resolve(
        &self,
        item: &ExtractedFoodItem,
        events: &dyn EventSink,
    ) -> Result<ResolvedNutrientProfile> {
        if let Some(profile) = self.cache.get(&item.food_name, &item.quantity).await {
            events.emit(ResolutionEvent::CacheHit {
                food_name: item.food_name.clone(),
            });
            return Ok(profile);
        }

        let profile = self.inner.resolve(item, events).await?;
        if profile.source == NutrientSource::Database && !profile.is_error() {
            self.cache
                .insert(&item.food_name, &item.quantity, profile.clone())
                .await;
        }
        Ok(profile)
    }
}
