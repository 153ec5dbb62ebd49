//! Nutrition database candidate records

use serde::{Deserialize, Serialize};

/// Data-quality tier of a nutrition record.
///
/// Lab-analysed reference data (`SrLegacy`, `Foundation`) outranks survey
/// data, which outranks self-reported label data (`Branded`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "SR Legacy")]
    SrLegacy,
    Foundation,
    #[serde(rename = "Survey (FNDDS)")]
    Survey,
    Branded,
    /// Any tier string the database adds later.
    #[serde(other)]
    Unknown,
}

impl DataType {
    /// Tiers requested from the database, in the order USDA documents them.
    pub const SEARCHABLE: [DataType; 4] = [
        DataType::SrLegacy,
        DataType::Foundation,
        DataType::Survey,
        DataType::Branded,
    ];

    /// Parse the database's tier label. Unrecognised labels map to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "SR Legacy" => DataType::SrLegacy,
            "Foundation" => DataType::Foundation,
            "Survey (FNDDS)" | "Survey" => DataType::Survey,
            "Branded" => DataType::Branded,
            _ => DataType::Unknown,
        }
    }

    /// The database's label for this tier.
    pub fn label(&self) -> &'static str {
        match self {
            DataType::SrLegacy => "SR Legacy",
            DataType::Foundation => "Foundation",
            DataType::Survey => "Survey (FNDDS)",
            DataType::Branded => "Branded",
            DataType::Unknown => "Unknown",
        }
    }

    /// Base score contributed by the tier during candidate selection.
    pub fn tier_score(&self) -> u32 {
        match self {
            DataType::SrLegacy | DataType::Foundation => 100,
            DataType::Survey => 50,
            DataType::Branded | DataType::Unknown => 0,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single nutrient value on a candidate record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrient {
    pub name: String,
    pub value: f64,
    pub unit: String,
}

impl Nutrient {
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
        }
    }
}

/// One search result from the nutrition database.
///
/// Values are per 100 g of the described food. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientCandidate {
    pub description: String,
    pub data_type: DataType,
    #[serde(default)]
    pub nutrients: Vec<Nutrient>,
}

impl NutrientCandidate {
    pub fn new(description: impl Into<String>, data_type: DataType) -> Self {
        Self {
            description: description.into(),
            data_type,
            nutrients: Vec::new(),
        }
    }

    /// Append a nutrient (builder style, mostly for tests and fixtures).
    pub fn with_nutrient(mut self, name: &str, value: f64, unit: &str) -> Self {
        self.nutrients.push(Nutrient::new(name, value, unit));
        self
    }

    /// Whether a nutrient with exactly this name is present.
    pub fn has_nutrient(&self, name: &str) -> bool {
        self.nutrients.iter().any(|n| n.name == name)
    }

    /// First nutrient with exactly this name.
    pub fn nutrient(&self, name: &str) -> Option<&Nutrient> {
        self.nutrients.iter().find(|n| n.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_usda_labels() {
        assert_eq!(DataType::from_label("SR Legacy"), DataType::SrLegacy);
        assert_eq!(DataType::from_label("Survey (FNDDS)"), DataType::Survey);
        assert_eq!(DataType::from_label("Experimental"), DataType::Unknown);
    }

    #[test]
    fn serde_uses_usda_labels() {
        let t: DataType = serde_json::from_str(r#""Survey (FNDDS)""#).unwrap();
        assert_eq!(t, DataType::Survey);
        let t: DataType = serde_json::from_str(r#""Sub-sample""#).unwrap();
        assert_eq!(t, DataType::Unknown);
    }

    #[test]
    fn tier_scores() {
        assert_eq!(DataType::Foundation.tier_score(), 100);
        assert_eq!(DataType::SrLegacy.tier_score(), 100);
        assert_eq!(DataType::Survey.tier_score(), 50);
        assert_eq!(DataType::Branded.tier_score(), 0);
        assert_eq!(DataType::Unknown.tier_score(), 0);
    }

    #[test]
    fn nutrient_lookup_is_exact() {
        let c = NutrientCandidate::new("Rice, white", DataType::SrLegacy)
            .with_nutrient("Protein", 2.7, "G");
        assert!(c.has_nutrient("Protein"));
        assert!(!c.has_nutrient("protein"));
        assert_eq!(c.nutrient("Protein").map(|n| n.value), Some(2.7));
    }
}
