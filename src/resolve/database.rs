//! Database lookup strategy.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use super::Resolver;
use super::scoring::{extract_macros, select_best};
use crate::providers::NutritionDatabase;
use crate::types::{
    EventSink, ExtractedFoodItem, NutrientSource, ResolutionEvent, ResolvedNutrientProfile,
};
use crate::{PlatewiseError, Result};

/// Candidates requested per search.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Quantity reported for a database hit whose item had none.
pub const PER_100G: &str = "per 100g";

/// Resolves an item from the nutrition database's best-scoring record.
///
/// Fails (so the chain falls back) when the search errors, returns no
/// candidates, or the winning record rounds to zero calories. Values are
/// reported as the record states them; no scaling to the item's quantity.
pub struct DatabaseResolver {
    database: Arc<dyn NutritionDatabase>,
    page_size: u32,
}

impl DatabaseResolver {
    pub fn new(database: Arc<dyn NutritionDatabase>) -> Self {
        Self {
            database,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the number of candidates requested per search.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

#[async_trait]
impl Resolver for DatabaseResolver {
    fn name(&self) -> &str {
        "database"
    }

    #[instrument(skip_all, fields(food_name = %item.food_name, database = self.database.name()))]
    async fn resolve(
        &self,
        item: &ExtractedFoodItem,
        events: &dyn EventSink,
    ) -> Result<ResolvedNutrientProfile> {
        events.emit(ResolutionEvent::LookupAttempted {
            food_name: item.food_name.clone(),
        });

        let candidates = match self
            .database
            .search_foods(&item.food_name, self.page_size)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                events.emit(ResolutionEvent::LookupFailed {
                    food_name: item.food_name.clone(),
                    reason: e.to_string(),
                });
                return Err(e);
            }
        };

        let Some((best, score)) = select_best(&candidates) else {
            let err = PlatewiseError::NoCandidates(item.food_name.clone());
            events.emit(ResolutionEvent::LookupFailed {
                food_name: item.food_name.clone(),
                reason: err.to_string(),
            });
            return Err(err);
        };

        events.emit(ResolutionEvent::LookupScored {
            food_name: item.food_name.clone(),
            description: best.description.clone(),
            data_type: best.data_type,
            score,
            candidates: candidates.len(),
        });

        let food_name = if best.description.trim().is_empty() {
            item.food_name.clone()
        } else {
            best.description.clone()
        };
        let quantity = if item.quantity.trim().is_empty() {
            PER_100G.to_string()
        } else {
            item.quantity.clone()
        };

        let profile = ResolvedNutrientProfile::new(
            food_name,
            quantity,
            &extract_macros(best),
            NutrientSource::Database,
        );

        if profile.calories == 0 {
            events.emit(ResolutionEvent::ZeroCaloriesDiscarded {
                food_name: item.food_name.clone(),
                description: best.description.clone(),
            });
            return Err(PlatewiseError::ZeroCalories {
                description: best.description.clone(),
            });
        }

        Ok(profile)
    }
}
