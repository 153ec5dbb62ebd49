//! Candidate scoring and macro extraction for database records.
//!
//! Score = data-tier base (SR Legacy / Foundation 100, Survey 50, Branded 0)
//! plus 25 for each target nutrient the record lists, so the maximum is 200.
//! The strictly highest score wins; ties keep the earlier candidate, which
//! preserves the database's own relevance ranking.

use crate::types::{MacroEstimate, NutrientCandidate};

/// Nutrient name carrying energy.
pub const ENERGY: &str = "Energy";
/// Nutrient name carrying protein grams.
pub const PROTEIN: &str = "Protein";
/// Nutrient name carrying carbohydrate grams.
pub const CARBOHYDRATE: &str = "Carbohydrate, by difference";
/// Nutrient name carrying fat grams.
pub const FAT: &str = "Total lipid (fat)";

/// Nutrients whose presence adds to a candidate's score.
pub const TARGET_NUTRIENTS: [&str; 4] = [ENERGY, PROTEIN, CARBOHYDRATE, FAT];

/// Points per target nutrient present.
pub const NUTRIENT_BONUS: u32 = 25;

/// Kilojoules per kilocalorie.
const KJ_PER_KCAL: f64 = 4.184;

/// Score one candidate. Deterministic: same record, same score.
pub fn score_candidate(candidate: &NutrientCandidate) -> u32 {
    let present = TARGET_NUTRIENTS
        .iter()
        .filter(|name| candidate.has_nutrient(name))
        .count() as u32;
    candidate.data_type.tier_score() + present * NUTRIENT_BONUS
}

/// Pick the best-scoring candidate, first listed on ties.
pub fn select_best(candidates: &[NutrientCandidate]) -> Option<(&NutrientCandidate, u32)> {
    let mut best: Option<(&NutrientCandidate, u32)> = None;
    for candidate in candidates {
        let score = score_candidate(candidate);
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((candidate, score)),
        }
    }
    best
}

/// Pull raw calorie and macro values out of a record.
///
/// Values are matched by exact nutrient name; missing macros read as 0.
/// Rounding and clamping happen when the profile is built.
pub fn extract_macros(candidate: &NutrientCandidate) -> MacroEstimate {
    let grams = |name: &str| candidate.nutrient(name).map(|n| n.value).unwrap_or(0.0);
    MacroEstimate {
        calories: energy_kcal(candidate),
        protein: grams(PROTEIN),
        carbs: grams(CARBOHYDRATE),
        fat: grams(FAT),
    }
}

/// Energy in kcal.
///
/// Records may list energy more than once (kcal and kJ). A kcal entry wins;
/// a kJ entry is converted; anything else is taken at face value.
fn energy_kcal(candidate: &NutrientCandidate) -> f64 {
    let mut fallback = None;
    for nutrient in candidate.nutrients.iter().filter(|n| n.name == ENERGY) {
        if nutrient.unit.eq_ignore_ascii_case("kcal") {
            return nutrient.value;
        }
        if fallback.is_none() {
            fallback = Some(if nutrient.unit.eq_ignore_ascii_case("kj") {
                nutrient.value / KJ_PER_KCAL
            } else {
                nutrient.value
            });
        }
    }
    fallback.unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn full(description: &str, data_type: DataType) -> NutrientCandidate {
        NutrientCandidate::new(description, data_type)
            .with_nutrient(ENERGY, 165.0, "KCAL")
            .with_nutrient(PROTEIN, 31.0, "G")
            .with_nutrient(CARBOHYDRATE, 0.0, "G")
            .with_nutrient(FAT, 3.6, "G")
    }

    #[test]
    fn tier_plus_nutrients() {
        assert_eq!(score_candidate(&full("a", DataType::SrLegacy)), 200);
        assert_eq!(score_candidate(&full("a", DataType::Foundation)), 200);
        assert_eq!(score_candidate(&full("a", DataType::Survey)), 150);
        assert_eq!(score_candidate(&full("a", DataType::Branded)), 100);
        assert_eq!(score_candidate(&full("a", DataType::Unknown)), 100);
    }

    #[test]
    fn bare_branded_scores_zero() {
        let c = NutrientCandidate::new("x", DataType::Branded);
        assert_eq!(score_candidate(&c), 0);
    }

    #[test]
    fn repeated_nutrient_counts_once() {
        let c = NutrientCandidate::new("x", DataType::Branded)
            .with_nutrient(ENERGY, 100.0, "KCAL")
            .with_nutrient(ENERGY, 418.0, "kJ");
        assert_eq!(score_candidate(&c), 25);
    }

    #[test]
    fn higher_tier_beats_earlier_branded() {
        let candidates = vec![
            full("Branded chicken", DataType::Branded),
            NutrientCandidate::new("Chicken, SR", DataType::SrLegacy)
                .with_nutrient(ENERGY, 200.0, "KCAL"),
        ];
        let (best, score) = select_best(&candidates).unwrap();
        assert_eq!(best.description, "Chicken, SR");
        assert_eq!(score, 125);
    }

    #[test]
    fn ties_keep_first() {
        let candidates = vec![
            full("first", DataType::Foundation),
            full("second", DataType::SrLegacy),
        ];
        let (best, _) = select_best(&candidates).unwrap();
        assert_eq!(best.description, "first");
    }

    #[test]
    fn empty_has_no_winner() {
        assert!(select_best(&[]).is_none());
    }

    #[test]
    fn extracts_exact_names_only() {
        let c = NutrientCandidate::new("x", DataType::SrLegacy)
            .with_nutrient("Energy (Atwater General Factors)", 999.0, "KCAL")
            .with_nutrient(PROTEIN, 5.0, "G");
        let m = extract_macros(&c);
        assert_eq!(m.calories, 0.0);
        assert_eq!(m.protein, 5.0);
        assert_eq!(m.carbs, 0.0);
        assert_eq!(m.fat, 0.0);
    }

    #[test]
    fn prefers_kcal_over_kj() {
        let c = NutrientCandidate::new("x", DataType::Foundation)
            .with_nutrient(ENERGY, 690.0, "kJ")
            .with_nutrient(ENERGY, 165.0, "KCAL");
        assert_eq!(extract_macros(&c).calories, 165.0);
    }

    #[test]
    fn converts_kj_only() {
        let c =
            NutrientCandidate::new("x", DataType::Foundation).with_nutrient(ENERGY, 418.4, "kJ");
        assert!((extract_macros(&c).calories - 100.0).abs() < 1e-9);
    }
}
