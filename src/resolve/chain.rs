//! Ordered fallback chain of resolver strategies.

use std::sync::Arc;

use tracing::instrument;

use super::Resolver;
use crate::types::{EventSink, ExtractedFoodItem, ResolutionEvent, ResolvedNutrientProfile};

/// Strategies tried in order; the first success wins.
///
/// Any strategy error falls through to the next one. When every strategy
/// has failed (or none is configured) the item gets the zero-valued
/// "Failed to estimate" profile, so [`resolve()`](Self::resolve) itself is
/// infallible.
#[derive(Clone, Default)]
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn Resolver>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy (lowest priority so far).
    pub fn with(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    /// Append a strategy in place.
    pub fn push(&mut self, resolver: Arc<dyn Resolver>) {
        self.resolvers.push(resolver);
    }

    /// Strategy names in priority order.
    pub fn names(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Resolve one item. Always produces exactly one profile.
    #[instrument(skip_all, fields(food_name = %item.food_name))]
    pub async fn resolve(
        &self,
        item: &ExtractedFoodItem,
        events: &dyn EventSink,
    ) -> ResolvedNutrientProfile {
        let mut remaining = self.resolvers.len();
        for resolver in &self.resolvers {
            remaining -= 1;
            match resolver.resolve(item, events).await {
                Ok(profile) => {
                    events.emit(ResolutionEvent::ItemResolved {
                        food_name: item.food_name.clone(),
                        source: profile.source,
                        error: profile.is_error(),
                    });
                    return profile;
                }
                Err(e) if remaining > 0 => {
                    events.emit(ResolutionEvent::FallbackTriggered {
                        food_name: item.food_name.clone(),
                        strategy: resolver.name().to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(_) => {}
            }
        }

        let profile = ResolvedNutrientProfile::estimation_failed(item);
        events.emit(ResolutionEvent::ItemResolved {
            food_name: item.food_name.clone(),
            source: profile.source,
            error: true,
        });
        profile
    }
}
