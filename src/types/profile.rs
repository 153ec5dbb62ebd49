//! Resolved nutrient profiles and meal totals

use serde::{Deserialize, Serialize};

use super::food::ExtractedFoodItem;

/// Per-item error reported when no strategy could produce a profile.
pub const ESTIMATION_FAILED_MESSAGE: &str = "Failed to estimate";

/// Which path produced a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientSource {
    Database,
    AiEstimate,
}

impl NutrientSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientSource::Database => "database",
            NutrientSource::AiEstimate => "ai_estimate",
        }
    }
}

impl std::fmt::Display for NutrientSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrounded macro values, as reported by a record or an estimator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroEstimate {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroEstimate {
    /// Whether every value is a finite number.
    pub fn is_finite(&self) -> bool {
        [self.calories, self.protein, self.carbs, self.fat]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Final nutrient profile for one extracted item.
///
/// Calories are whole kcal and never negative; macros are grams rounded to
/// one decimal. Built fresh by each strategy, never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedNutrientProfile {
    pub food_name: String,
    pub quantity: String,
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub source: NutrientSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolvedNutrientProfile {
    /// Build a profile from raw values, applying the rounding rules.
    pub fn new(
        food_name: impl Into<String>,
        quantity: impl Into<String>,
        values: &MacroEstimate,
        source: NutrientSource,
    ) -> Self {
        Self {
            food_name: food_name.into(),
            quantity: quantity.into(),
            calories: round_calories(values.calories),
            protein: round_grams(values.protein),
            carbs: round_grams(values.carbs),
            fat: round_grams(values.fat),
            source,
            error: None,
        }
    }

    /// Zero-valued profile for an item whose estimation failed.
    pub fn estimation_failed(item: &ExtractedFoodItem) -> Self {
        Self {
            food_name: item.food_name.clone(),
            quantity: item.quantity.clone(),
            calories: 0,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
            source: NutrientSource::AiEstimate,
            error: Some(ESTIMATION_FAILED_MESSAGE.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Sum of a meal's profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MealTotals {
    pub calories: u32,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MealTotals {
    pub fn from_profiles(profiles: &[ResolvedNutrientProfile]) -> Self {
        let sum = profiles.iter().fold(Self::default(), |acc, p| Self {
            calories: acc.calories.saturating_add(p.calories),
            protein: acc.protein + p.protein,
            carbs: acc.carbs + p.carbs,
            fat: acc.fat + p.fat,
        });
        Self {
            protein: round_grams(sum.protein),
            carbs: round_grams(sum.carbs),
            fat: round_grams(sum.fat),
            ..sum
        }
    }
}

/// Full result of analyzing one meal photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealAnalysis {
    pub foods: Vec<ResolvedNutrientProfile>,
    pub totals: MealTotals,
}

impl MealAnalysis {
    pub fn new(foods: Vec<ResolvedNutrientProfile>) -> Self {
        let totals = MealTotals::from_profiles(&foods);
        Self { foods, totals }
    }
}

/// Round kcal to the nearest integer (half away from zero), clamping
/// negative and non-finite values to 0.
pub fn round_calories(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.round().min(f64::from(u32::MAX)) as u32
}

/// Round grams to one decimal (half away from zero), clamping negative and
/// non-finite values to 0.
pub fn round_grams(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_rules() {
        assert_eq!(round_calories(129.5), 130);
        assert_eq!(round_calories(129.49), 129);
        assert_eq!(round_calories(-5.0), 0);
        assert_eq!(round_calories(f64::NAN), 0);
        assert_eq!(round_grams(2.66), 2.7);
        assert_eq!(round_grams(2.64), 2.6);
        assert_eq!(round_grams(0.05), 0.1);
        assert_eq!(round_grams(-1.0), 0.0);
    }

    #[test]
    fn profile_serializes_for_the_ui() {
        let profile = ResolvedNutrientProfile::new(
            "Rice, white, cooked",
            "1 cup",
            &MacroEstimate {
                calories: 130.4,
                protein: 2.69,
                carbs: 28.17,
                fat: 0.28,
            },
            NutrientSource::Database,
        );
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["foodName"], "Rice, white, cooked");
        assert_eq!(json["calories"], 130);
        assert_eq!(json["protein"], 2.7);
        assert_eq!(json["source"], "database");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn failed_profile_is_zeroed() {
        let item = ExtractedFoodItem::new("mystery stew", "1 bowl");
        let profile = ResolvedNutrientProfile::estimation_failed(&item);
        assert_eq!(profile.calories, 0);
        assert_eq!(profile.source, NutrientSource::AiEstimate);
        assert_eq!(profile.error.as_deref(), Some(ESTIMATION_FAILED_MESSAGE));
        assert_eq!(
            serde_json::to_value(&profile).unwrap()["source"],
            "ai_estimate"
        );
    }

    #[test]
    fn totals_sum_profiles() {
        let a = ResolvedNutrientProfile::new(
            "a",
            "1",
            &MacroEstimate {
                calories: 100.0,
                protein: 1.1,
                carbs: 2.2,
                fat: 3.3,
            },
            NutrientSource::Database,
        );
        let b = ResolvedNutrientProfile::new(
            "b",
            "1",
            &MacroEstimate {
                calories: 50.0,
                protein: 0.2,
                carbs: 0.1,
                fat: 0.0,
            },
            NutrientSource::AiEstimate,
        );
        let totals = MealTotals::from_profiles(&[a, b]);
        assert_eq!(totals.calories, 150);
        assert_eq!(totals.protein, 1.3);
        assert_eq!(totals.carbs, 2.3);
        assert_eq!(totals.fat, 3.3);
    }
}
