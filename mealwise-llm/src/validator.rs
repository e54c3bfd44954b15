//! Generate-validate-retry loop for structured recipe output.
//!
//! Generative services wrap JSON in markdown fences, drop fields, and emit
//! counts as strings. Each attempt here is: invoke, strip fences, parse,
//! validate. The first valid document wins; there is no repair or merging
//! across attempts.

use crate::GenerationProvider;
use mealwise_core::{
    GenerationRequest, MealwiseError, RecipeIngredient, ValidatedRecipe, ValidationError,
};
use serde_json::Value;
use std::sync::Arc;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Remove a leading "```json" (or bare "```") and a trailing "```".
///
/// Both ends are handled independently and the result is trimmed.
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix(JSON_FENCE) {
        text = rest;
    } else if let Some(rest) = text.strip_prefix(FENCE) {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }
    text.trim()
}

/// Check the structural invariants of a recipe document.
///
/// `recipe.ingredients` must be a non-empty list and every entry must carry
/// a `count` that is a JSON integer. Counts outside 1..=9 are accepted;
/// counts beyond `i64::MAX` saturate in the returned ingredient list.
pub fn validate_recipe(document: &Value) -> Result<Vec<RecipeIngredient>, ValidationError> {
    let recipe = document
        .get("recipe")
        .ok_or_else(|| missing("recipe"))?;
    let ingredients = recipe
        .get("ingredients")
        .ok_or_else(|| missing("recipe.ingredients"))?
        .as_array()
        .ok_or_else(|| invalid("recipe.ingredients", "not a list"))?;

    if ingredients.is_empty() {
        return Err(invalid("recipe.ingredients", "empty"));
    }

    ingredients
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let field = format!("recipe.ingredients[{}].count", i);
            let count = match item.get("count") {
                None => return Err(missing(&field)),
                Some(Value::Number(n)) => match (n.as_i64(), n.is_u64()) {
                    (Some(count), _) => count,
                    (None, true) => i64::MAX,
                    (None, false) => {
                        return Err(invalid(&field, format!("{} is not an integer", n)))
                    }
                },
                Some(other) => {
                    return Err(invalid(&field, format!("{} is not an integer", other)))
                }
            };
            if !(1..=9).contains(&count) {
                tracing::debug!(field = %field, count, "Ingredient count outside 1..=9");
            }
            let name = item
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Ok(RecipeIngredient { name, count })
        })
        .collect()
}

fn missing(field: &str) -> ValidationError {
    ValidationError::RequiredFieldMissing {
        field: field.to_string(),
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Bounded retry loop around a [`GenerationProvider`].
pub struct GenerationValidator {
    provider: Arc<dyn GenerationProvider>,
    max_attempts: u32,
}

impl GenerationValidator {
    pub fn new(provider: Arc<dyn GenerationProvider>, max_attempts: u32) -> Self {
        Self {
            provider,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run up to `max_attempts` generations and return the first valid one.
    ///
    /// Provider failures, unparsable output, and invalid documents each
    /// consume one attempt. Returns `None` once attempts are exhausted.
    pub async fn generate(&self, request: &GenerationRequest) -> Option<ValidatedRecipe> {
        for attempt in 1..=self.max_attempts {
            match self.attempt(request).await {
                Ok((document, ingredients)) => {
                    tracing::info!(
                        provider = self.provider.provider_id(),
                        attempt,
                        ingredients = ingredients.len(),
                        "Accepted generated recipe"
                    );
                    return Some(ValidatedRecipe {
                        document,
                        ingredients,
                        attempt,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        provider = self.provider.provider_id(),
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Generated recipe rejected"
                    );
                }
            }
        }

        tracing::warn!(
            provider = self.provider.provider_id(),
            attempts = self.max_attempts,
            "Recipe generation exhausted all attempts"
        );
        None
    }

    async fn attempt(
        &self,
        request: &GenerationRequest,
    ) -> Result<(Value, Vec<RecipeIngredient>), MealwiseError> {
        let raw = self.provider.complete(request).await?;
        let document: Value = serde_json::from_str(strip_fences(&raw)).map_err(|e| {
            ValidationError::MalformedJson {
                reason: e.to_string(),
            }
        })?;
        let ingredients = validate_recipe(&document)?;
        Ok((document, ingredients))
    }
}

impl std::fmt::Debug for GenerationValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationValidator")
            .field("provider", &self.provider.provider_id())
            .field("max_attempts", &self.max_attempts)
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

        /// Any integer count passes; the same count as a string never does.
        #[test]
        fn prop_integer_counts_accepted_strings_rejected(count in -100i64..100) {
            let ok = json!({"recipe": {"ingredients": [{"name": "x", "count": count}]}});
            let bad = json!({"recipe": {"ingredients": [{"name": "x", "count": count.to_string()}]}});
            prop_assert_eq!(validate_recipe(&ok).unwrap()[0].count, count);
            prop_assert!(validate_recipe(&bad).is_err());
        }

        /// Fencing never changes what parses.
        #[test]
        fn prop_fencing_is_transparent(a in 0i64..1000, key in "[a-z]{1,8}") {
            let bare = format!("{{\"{}\":{}}}", key, a);
            let fenced = format!("```json\n{}\n```", bare);
            prop_assert_eq!(strip_fences(&fenced), bare.as_str());
        }
    }
}
