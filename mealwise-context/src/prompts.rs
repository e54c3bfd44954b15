//! Prompt text for advice and recipe generation.

use crate::orchestrator::RecipeRequest;
use mealwise_core::{NutritionFact, UserPreferences};
use mealwise_knowledge::Neighbor;

// ============================================================================
// ADVICE
// ============================================================================

pub const ADVICE_SYSTEM_PROMPT: &str = "You are a nutrition expert. Using food nutrient data, \
you give practical advice for healthy eating.";

/// Retrieval context for one advice request.
///
/// Lists at most `max_facts` facts and `max_neighbors` similar foods, in the
/// order given. Empty sections are omitted.
pub fn build_context_block(
    query: &str,
    facts: &[NutritionFact],
    neighbors: &[Neighbor],
    max_facts: usize,
    max_neighbors: usize,
) -> String {
    let mut parts = vec![format!("Requested food: {}", query)];

    if !facts.is_empty() && max_facts > 0 {
        let lines: Vec<String> = facts
            .iter()
            .take(max_facts)
            .map(|f| format!("- {}", f.summary_line()))
            .collect();
        parts.push(format!("Nutrition facts:\n{}", lines.join("\n")));
    }

    if !neighbors.is_empty() && max_neighbors > 0 {
        let lines: Vec<String> = neighbors
            .iter()
            .take(max_neighbors)
            .map(|n| format!("- {} (similarity: {:.2})", n.name, n.score))
            .collect();
        parts.push(format!("Similar foods:\n{}", lines.join("\n")));
    }

    parts.join("\n\n")
}

/// User prompt wrapping a context block.
pub fn advice_prompt(context: &str) -> String {
    format!(
        "Provide a nutrition analysis and health advice for the following food.\n\n\
         {context}\n\n\
         Cover these points:\n\
         1. Key nutrient analysis\n\
         2. Health benefits and cautions\n\
         3. Recommended serving size and frequency\n\
         4. Foods that pair well with it\n\
         5. Advice from a diet and health-management perspective\n\n\
         Explain in a friendly, easy-to-follow way."
    )
}

// ============================================================================
// RECIPE
// ============================================================================

const RECIPE_SCHEMA: &str = r#"{
    "recipe": {
        "name": "String - dish title",
        "description": "String - 1-2 sentences including why this dish was chosen, expected cooking time, and servings",
        "ingredients": [
            {
                "name": "String - ingredient name",
                "count": "Integer - a whole number from 1 to 9"
            }
        ],
        "cooking_steps": "String - numbered steps separated by newlines, ending with a tip",
        "nutrition": {
            "ingredients": [
                "ingredient (calories, carbohydrate, protein, fat, sugar)"
            ],
            "total": "total (calories, carbohydrate, protein, fat, sugar)"
        }
    }
}"#;

/// System instruction for recipe generation.
pub fn recipe_system_prompt(preferences: &UserPreferences) -> String {
    format!(
        "# Persona\n\
         You are a recipe data formatter. You output JSON data only. Your single task is to \
         emit exactly one valid JSON object that follows every rule and the schema below.\n\n\
         # Main Task\n\
         From the user's ingredients and preferences, create one recipe that follows the JSON schema.\n\n\
         # User Preferences\n\
         * good: {good}\n\
         * bad: {bad}\n\n\
         # Core Instructions\n\
         1. Reflect the 'good' styles and never include 'bad' ingredients or styles.\n\
         2. Use at least 2 of the user's ingredients.\n\
         3. Keep the difficulty at beginner level.\n\
         4. Fill in nutrition for every ingredient.\n\n\
         # Output Rules\n\
         1. The response is one complete JSON object from start to finish.\n\
         2. Add no explanation, greeting, note, or code fence (```) outside the JSON object.\n\
         3. Follow the JSON schema exactly.\n\n\
         # JSON Schema\n\
         {schema}",
        good = preferences.good,
        bad = preferences.bad,
        schema = RECIPE_SCHEMA,
    )
}

/// User prompt listing the pantry as JSON.
pub fn recipe_user_prompt(request: &RecipeRequest) -> String {
    let pantry = serde_json::to_string(&request.pantry).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Generate the JSON response for this request.\n\
         User request (available ingredients): {}",
        pantry
    )
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use mealwise_test_utils::generators::{arb_nutrition_fact, arb_pantry_item};
    use proptest::prelude::*;

    fn arb_neighbor() -> impl Strategy<Value = Neighbor> {
        ("[a-z]{1,10}", 0.0f32..1.0).prop_map(|(name, score)| Neighbor { name, score })
    }

    /// Lines listed under `header`, or none when the section is absent.
    fn section_lines<'a>(block: &'a str, header: &str) -> Vec<&'a str> {
        block
            .split("\n\n")
            .find_map(|part| part.strip_prefix(header))
            .map(|body| body.lines().collect())
            .unwrap_or_default()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The block lists a prefix of the facts and neighbors, capped and in order.
        #[test]
        fn prop_context_block_is_capped_prefix(
            facts in prop::collection::vec(arb_nutrition_fact(), 0..6),
            neighbors in prop::collection::vec(arb_neighbor(), 0..6),
            max_facts in 0usize..5,
            max_neighbors in 0usize..5,
        ) {
            let block = build_context_block("query", &facts, &neighbors, max_facts, max_neighbors);

            let expected_facts: Vec<String> = facts
                .iter()
                .take(max_facts)
                .map(|f| format!("- {}", f.summary_line()))
                .collect();
            prop_assert_eq!(section_lines(&block, "Nutrition facts:\n"), expected_facts);

            let expected_neighbors: Vec<String> = neighbors
                .iter()
                .take(max_neighbors)
                .map(|n| format!("- {} (similarity: {:.2})", n.name, n.score))
                .collect();
            prop_assert_eq!(section_lines(&block, "Similar foods:\n"), expected_neighbors);
        }

        /// Every pantry item reaches the recipe prompt.
        #[test]
        fn prop_recipe_prompt_lists_pantry(pantry in prop::collection::vec(arb_pantry_item(), 1..8)) {
            let prompt = recipe_user_prompt(&RecipeRequest {
                pantry: pantry.clone(),
                preferences: UserPreferences::default(),
            });
            for item in &pantry {
                let entry = format!(r#"{{"name":"{}","count":{}}}"#, item.name, item.count);
                prop_assert!(prompt.contains(&entry));
            }
        }
    }
}
