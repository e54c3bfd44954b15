//! Canonical nutrition records.

use serde::{Deserialize, Serialize};

/// Provider-independent nutrition record.
///
/// Every numeric field is zero when the upstream record omits it, and text
/// fields are empty, so a single missing field never fails a decode.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionFact {
    pub name: String,
    pub category: String,
    pub energy_kcal: f64,
    pub carbohydrate_g: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub sugar_g: f64,
    pub sodium_mg: f64,
    pub cholesterol_mg: f64,
    pub reference_amount_g: f64,
}

impl NutritionFact {
    /// Create a fact with only the identifying fields set.
    pub fn named(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    /// One-line summary used in prompt context blocks.
    pub fn summary_line(&self) -> String {
        format!(
            "{}: {}kcal, carbohydrate {}g, protein {}g, fat {}g",
            self.name, self.energy_kcal, self.carbohydrate_g, self.protein_g, self.fat_g
        )
    }
}
