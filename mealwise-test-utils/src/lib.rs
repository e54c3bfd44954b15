//! Mealwise Test Utilities
//!
//! Shared test infrastructure for the Mealwise workspace:
//! - Proptest generators for core types
//! - Re-exported mock providers and sources
//! - Fixtures for provider payloads, recipe documents, and config
//! - Assertions for `Outcome` and `MealwiseResult`

// Re-export mocks from their source crates
pub use mealwise_knowledge::StaticNutritionSource;
pub use mealwise_llm::{FailingEmbeddingProvider, MockEmbeddingProvider, MockGenerationProvider};
pub use mealwise_storage::{LookupCache, SnapshotFiles};

// Re-export core types for convenience
pub use mealwise_core::{
    CacheEntry, EmbeddingVector, MealwiseConfig, MealwiseError, MealwiseResult, NutritionFact,
    Outcome, PantryItem, RecipeIngredient, Timestamp, UserPreferences, ValidatedRecipe,
};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Mealwise types.

    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    /// Food names as users type them: Latin or Hangul words, spaces, punctuation.
    pub fn arb_food_name() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-zA-Z][a-zA-Z ]{0,20}",
            "[가-힣]{1,8}",
            "[a-z]{1,8}[/.()-][a-z]{0,8}",
        ]
    }

    /// Timestamp between 2020 and 2030.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1_577_836_800i64..1_893_456_000i64)
            .prop_map(|secs| Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now))
    }

    /// EmbeddingVector with the given dimensions.
    pub fn arb_embedding_vector(dimensions: usize) -> impl Strategy<Value = EmbeddingVector> {
        (
            prop::collection::vec(-1.0f32..1.0f32, dimensions),
            "[a-z]{3,10}",
        )
            .prop_map(|(data, model_id)| EmbeddingVector::new(data, model_id))
    }

    /// NutritionFact with plausible magnitudes.
    pub fn arb_nutrition_fact() -> impl Strategy<Value = NutritionFact> {
        (
            arb_food_name(),
            "[a-z]{0,10}",
            0.0f64..1000.0,
            0.0f64..200.0,
            0.0f64..100.0,
            0.0f64..100.0,
        )
            .prop_map(|(name, category, energy, carbohydrate, protein, fat)| NutritionFact {
                name,
                category,
                energy_kcal: energy,
                carbohydrate_g: carbohydrate,
                protein_g: protein,
                fat_g: fat,
                ..NutritionFact::default()
            })
    }

    pub fn arb_pantry_item() -> impl Strategy<Value = PantryItem> {
        ("[a-z]{2,12}", 1u32..10).prop_map(|(name, count)| PantryItem::new(name, count))
    }

    /// Recipe document with a non-empty, integer-counted ingredient list.
    pub fn arb_valid_recipe_document() -> impl Strategy<Value = serde_json::Value> {
        (
            "[A-Za-z ]{3,20}",
            prop::collection::vec(("[a-z]{2,10}", 1i64..10), 1..6),
        )
            .prop_map(|(name, ingredients)| {
                let ingredients: Vec<serde_json::Value> = ingredients
                    .into_iter()
                    .map(|(n, c)| serde_json::json!({"name": n, "count": c}))
                    .collect();
                serde_json::json!({"recipe": {"name": name, "ingredients": ingredients}})
            })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common scenarios.

    use super::*;
    use serde_json::{json, Value};
    use std::path::Path;

    pub const VALID_RECIPE_JSON: &str = r#"{"recipe":{"name":"Kimchi fried rice","description":"Quick weeknight rice.","ingredients":[{"name":"kimchi","count":2},{"name":"rice","count":1},{"name":"egg","count":1}],"cooking_steps":"1. Fry kimchi.\n2. Add rice.\n3. Top with egg.","nutrition":{"ingredients":["kimchi (36kcal)"],"total":"520kcal"}}}"#;

    /// Same document as the model often returns it: inside a fenced block.
    pub fn fenced_valid_recipe() -> String {
        format!("```json\n{}\n```", VALID_RECIPE_JSON)
    }

    /// Outputs the validator must reject, one per failure mode.
    pub fn invalid_recipe_outputs() -> Vec<&'static str> {
        vec![
            "Sure! Here is your recipe:",
            r#"{"recipe":{"name":"Empty","ingredients":[]}}"#,
            r#"{"recipe":{"name":"Stringly","ingredients":[{"name":"egg","count":"3"}]}}"#,
            r#"{"recipe":{"name":"Floaty","ingredients":[{"name":"egg","count":3.0}]}}"#,
            r#"{"name":"No recipe key"}"#,
        ]
    }

    /// Provider response with one item per `(name, energy)` pair.
    pub fn provider_response(items: &[(&str, f64)]) -> Value {
        let items: Vec<Value> = items
            .iter()
            .map(|(name, energy)| {
                json!({
                    "FOOD_NM": name,
                    "FOOD_CL_NM": "test",
                    "AMT_NUM1": energy,
                    "AMT_NUM2": "100",
                    "AMT_NUM3": "10.5",
                    "AMT_NUM4": 3,
                    "AMT_NUM5": "1.2"
                })
            })
            .collect();
        json!({"header": {"resultCode": "00"}, "body": {"items": items}})
    }

    pub fn kimchi_fact() -> NutritionFact {
        NutritionFact {
            energy_kcal: 18.0,
            carbohydrate_g: 3.2,
            protein_g: 1.6,
            fat_g: 0.4,
            reference_amount_g: 100.0,
            ..NutritionFact::named("Kimchi", "pickles")
        }
    }

    /// Static source that knows a handful of Korean dishes.
    pub fn korean_source() -> StaticNutritionSource {
        StaticNutritionSource::new()
            .with_response("Kimchi", provider_response(&[("Kimchi", 18.0)]))
            .with_response(
                "Kimchi stew",
                provider_response(&[("Kimchi stew", 120.0), ("Tuna kimchi stew", 140.0)]),
            )
            .with_response("Bibimbap", provider_response(&[("Bibimbap", 560.0)]))
            .with_response("Bulgogi", provider_response(&[("Bulgogi", 250.0)]))
    }

    pub fn sample_pantry() -> Vec<PantryItem> {
        vec![
            PantryItem::new("kimchi", 1),
            PantryItem::new("rice", 2),
            PantryItem::new("egg", 3),
            PantryItem::new("tofu", 1),
        ]
    }

    pub fn preferences_document() -> Value {
        json!({
            "users": [
                {"good": "spicy food", "bad": "cucumber"},
                {"good": "light meals"},
            ]
        })
    }

    /// Local config with cache and store directories under `root`.
    pub fn config_in(root: &Path) -> MealwiseConfig {
        let mut config = MealwiseConfig::default_local();
        config.cache.dir = root.join("cache");
        config.storage.embeddings_dir = root.join("embeddings");
        config
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertion helpers for Mealwise result types.

    use super::*;

    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &MealwiseResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    #[track_caller]
    pub fn assert_err<T: std::fmt::Debug>(result: &MealwiseResult<T>) {
        assert!(result.is_err(), "Expected Err, got Ok: {:?}", result);
    }

    #[track_caller]
    pub fn assert_complete<T: std::fmt::Debug>(outcome: &Outcome<T>) {
        assert!(
            !outcome.is_degraded(),
            "Expected Complete, got Degraded: {:?}",
            outcome.cause()
        );
    }

    #[track_caller]
    pub fn assert_degraded<T: std::fmt::Debug>(outcome: &Outcome<T>) {
        assert!(
            outcome.is_degraded(),
            "Expected Degraded, got Complete: {:?}",
            outcome.value()
        );
    }
}
