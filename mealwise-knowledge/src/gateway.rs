//! Cache-or-fetch nutrition lookup and provider record normalization.

use crate::source::NutritionSource;
use mealwise_core::{LookupError, NutritionFact, Outcome};
use mealwise_storage::LookupCache;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::Arc;

// ============================================================================
// NORMALIZATION
// ============================================================================

/// One record as the nutrient database returns it.
#[derive(Debug, Default, Deserialize)]
struct ProviderItem {
    #[serde(rename = "FOOD_NM", default, deserialize_with = "lenient_text")]
    name: String,
    #[serde(rename = "FOOD_CL_NM", default, deserialize_with = "lenient_text")]
    category: String,
    #[serde(rename = "AMT_NUM1", default, deserialize_with = "lenient_number")]
    energy: f64,
    #[serde(rename = "AMT_NUM2", default, deserialize_with = "lenient_number")]
    reference_amount: f64,
    #[serde(rename = "AMT_NUM3", default, deserialize_with = "lenient_number")]
    carbohydrate: f64,
    #[serde(rename = "AMT_NUM4", default, deserialize_with = "lenient_number")]
    protein: f64,
    #[serde(rename = "AMT_NUM5", default, deserialize_with = "lenient_number")]
    fat: f64,
    #[serde(rename = "AMT_NUM6", default, deserialize_with = "lenient_number")]
    sugar: f64,
    #[serde(rename = "AMT_NUM7", default, deserialize_with = "lenient_number")]
    sodium: f64,
    #[serde(rename = "AMT_NUM8", default, deserialize_with = "lenient_number")]
    cholesterol: f64,
}

impl From<ProviderItem> for NutritionFact {
    fn from(item: ProviderItem) -> Self {
        Self {
            name: item.name,
            category: item.category,
            energy_kcal: item.energy,
            carbohydrate_g: item.carbohydrate,
            protein_g: item.protein,
            fat_g: item.fat,
            sugar_g: item.sugar,
            sodium_mg: item.sodium,
            cholesterol_mg: item.cholesterol,
            reference_amount_g: item.reference_amount,
        }
    }
}

/// Numbers arrive as JSON numbers, numeric strings, or blanks.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().replace(',', "").parse().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(if number.is_finite() { number } else { 0.0 })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Map a raw provider response onto [`NutritionFact`]s.
///
/// Items are read from `body.items`, which may be a list, an object
/// wrapping the list under `item`, or a single record. A response with no
/// body or no items is an empty result, not an error.
pub fn normalize(payload: &Value) -> Result<Vec<NutritionFact>, LookupError> {
    let items = match payload.get("body").and_then(|body| body.get("items")) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(items) => items,
    };

    let records: Vec<&Value> = match items {
        Value::Array(list) => list.iter().collect(),
        Value::Object(map) => match map.get("item") {
            Some(Value::Array(list)) => list.iter().collect(),
            Some(single @ Value::Object(_)) => vec![single],
            Some(_) => Vec::new(),
            None => vec![items],
        },
        Value::String(s) if s.trim().is_empty() => Vec::new(),
        other => {
            return Err(LookupError::Decode {
                reason: format!("body.items has unexpected shape: {}", other),
            })
        }
    };

    records
        .into_iter()
        .map(|record| {
            ProviderItem::deserialize(record)
                .map(NutritionFact::from)
                .map_err(|e| LookupError::Decode {
                    reason: format!("bad nutrition record: {}", e),
                })
        })
        .collect()
}

// ============================================================================
// GATEWAY
// ============================================================================

/// Lookup cache in front of a [`NutritionSource`].
pub struct NutritionGateway {
    source: Arc<dyn NutritionSource>,
    cache: LookupCache,
}

impl NutritionGateway {
    pub fn new(source: Arc<dyn NutritionSource>, cache: LookupCache) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    /// Nutrition facts for `food_name`.
    ///
    /// Never fails: a transport or decode problem yields an empty list in
    /// a degraded outcome. With `use_cache`, a fresh cache entry short-cuts
    /// the lookup and a fresh lookup result is written back verbatim.
    pub async fn fetch(&self, food_name: &str, use_cache: bool) -> Outcome<Vec<NutritionFact>> {
        if use_cache {
            if let Some(payload) = self.cache.get(food_name) {
                tracing::debug!(food = %food_name, "Nutrition served from cache");
                return Self::normalized(food_name, &payload);
            }
        }

        let payload = match self.source.lookup(food_name).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(
                    food = %food_name,
                    source = self.source.source_name(),
                    error = %e,
                    "Nutrition lookup failed"
                );
                return Outcome::empty(e);
            }
        };

        if use_cache {
            if let Err(e) = self.cache.put(food_name, payload.clone()) {
                tracing::warn!(food = %food_name, error = %e, "Failed to cache nutrition lookup");
            }
        }

        Self::normalized(food_name, &payload)
    }

    fn normalized(food_name: &str, payload: &Value) -> Outcome<Vec<NutritionFact>> {
        match normalize(payload) {
            Ok(facts) => {
                tracing::debug!(food = %food_name, facts = facts.len(), "Nutrition normalized");
                Outcome::Complete(facts)
            }
            Err(e) => {
                tracing::warn!(food = %food_name, error = %e, "Nutrition response undecodable");
                Outcome::empty(e)
            }
        }
    }
}

impl std::fmt::Debug for NutritionGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NutritionGateway")
            .field("source", &self.source.source_name())
            .field("cache", &self.cache.dir())
            .finish()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Numeric strings and numbers normalize to the same value.
        #[test]
        fn prop_numeric_strings_match_numbers(energy in 0u32..5000) {
            let as_number = json!({"body": {"items": [{"AMT_NUM1": energy}]}});
            let as_string = json!({"body": {"items": [{"AMT_NUM1": energy.to_string()}]}});
            prop_assert_eq!(
                normalize(&as_number).unwrap()[0].energy_kcal,
                normalize(&as_string).unwrap()[0].energy_kcal
            );
        }

        /// Non-numeric text never fails normalization; it becomes zero.
        #[test]
        fn prop_garbage_numbers_are_zero(text in "[a-z]{1,10}") {
            let payload = json!({"body": {"items": [{"AMT_NUM4": text}]}});
            prop_assert_eq!(normalize(&payload).unwrap()[0].protein_g, 0.0);
        }
    }
}
