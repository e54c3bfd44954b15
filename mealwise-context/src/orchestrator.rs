//! The nutrition advisor: retrieval, prompt assembly, and generation.

use crate::prompts::{
    advice_prompt, build_context_block, recipe_system_prompt, recipe_user_prompt,
    ADVICE_SYSTEM_PROMPT,
};
use chrono::Utc;
use mealwise_core::{
    GenerationConfig, GenerationRequest, MealwiseResult, NutritionFact, PantryItem,
    RetrievalConfig, SamplingParams, Timestamp, UserPreferences, ValidatedRecipe,
};
use mealwise_knowledge::{FoodKnowledgeStore, Neighbor};
use mealwise_llm::{GenerationProvider, GenerationValidator, ProviderRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const RECIPE_FAILED_MESSAGE: &str = "recipe generation failed";

// ============================================================================
// REQUEST / RESPONSE TYPES
// ============================================================================

/// Free-text advice with the retrieval context it was based on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceResponse {
    pub query: String,
    pub timestamp: Timestamp,
    pub facts: Vec<NutritionFact>,
    pub neighbors: Vec<Neighbor>,
    /// Model text verbatim, or an inline error message
    pub narrative: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRequest {
    pub pantry: Vec<PantryItem>,
    #[serde(default)]
    pub preferences: UserPreferences,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecipeResponse {
    Generated { recipe: ValidatedRecipe },
    Failed { message: String },
}

impl RecipeResponse {
    pub fn recipe(&self) -> Option<&ValidatedRecipe> {
        match self {
            Self::Generated { recipe } => Some(recipe),
            Self::Failed { .. } => None,
        }
    }
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// Owns the knowledge store and a generation provider.
pub struct AdvisorOrchestrator {
    store: FoodKnowledgeStore,
    generator: Arc<dyn GenerationProvider>,
    validator: GenerationValidator,
    retrieval: RetrievalConfig,
    sampling: SamplingParams,
    include_ai_filters: bool,
}

impl AdvisorOrchestrator {
    pub fn new(
        store: FoodKnowledgeStore,
        generator: Arc<dyn GenerationProvider>,
        generation: &GenerationConfig,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            validator: GenerationValidator::new(generator.clone(), generation.max_attempts),
            store,
            generator,
            retrieval,
            sampling: generation.sampling.clone(),
            include_ai_filters: generation.include_ai_filters,
        }
    }

    /// Build from a registry. Fails if no generation provider is registered.
    pub fn from_registry(
        store: FoodKnowledgeStore,
        registry: &ProviderRegistry,
        generation: &GenerationConfig,
        retrieval: RetrievalConfig,
    ) -> MealwiseResult<Self> {
        Ok(Self::new(store, registry.generation()?, generation, retrieval))
    }

    pub fn store(&self) -> &FoodKnowledgeStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut FoodKnowledgeStore {
        &mut self.store
    }

    fn request(&self, system: impl Into<String>, prompt: impl Into<String>) -> GenerationRequest {
        GenerationRequest::new(system, prompt)
            .with_sampling(self.sampling.clone())
            .with_ai_filters(self.include_ai_filters)
    }

    /// Nutrition advice for `query`.
    ///
    /// Lookup and similarity search are always attempted and their failures
    /// only shrink the context. The model is called once and its text is
    /// returned unvalidated; a generation failure becomes the narrative.
    pub async fn advise(&self, query: &str) -> AdviceResponse {
        let facts = self.store.lookup(query, true).await;
        if let Some(cause) = facts.cause() {
            tracing::warn!(query = %query, error = %cause, "Advising without nutrition facts");
        }
        let facts = facts.into_value();

        let neighbors = self
            .store
            .find_similar(
                query,
                self.retrieval.max_results,
                self.retrieval.similarity_threshold,
            )
            .await;

        let context = build_context_block(
            query,
            &facts,
            &neighbors,
            self.retrieval.context_facts,
            self.retrieval.context_neighbors,
        );
        let request = self.request(ADVICE_SYSTEM_PROMPT, advice_prompt(&context));

        let narrative = match self.generator.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(query = %query, error = %e, "Advice generation failed");
                format!("An error occurred while generating advice: {}", e)
            }
        };

        AdviceResponse {
            query: query.to_string(),
            timestamp: Utc::now(),
            facts,
            neighbors,
            narrative,
        }
    }

    /// Conversational entry point; same as [`advise`](Self::advise).
    pub async fn chat(&self, message: &str) -> AdviceResponse {
        self.advise(message).await
    }

    /// Generate a validated recipe from a pantry and preferences.
    pub async fn recommend_recipe(&self, request: &RecipeRequest) -> RecipeResponse {
        let generation = self.request(
            recipe_system_prompt(&request.preferences),
            recipe_user_prompt(request),
        );

        match self.validator.generate(&generation).await {
            Some(recipe) => RecipeResponse::Generated { recipe },
            None => {
                tracing::error!(
                    pantry = request.pantry.len(),
                    attempts = self.validator.max_attempts(),
                    "No valid recipe produced"
                );
                RecipeResponse::Failed {
                    message: RECIPE_FAILED_MESSAGE.to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for AdvisorOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvisorOrchestrator")
            .field("store", &self.store)
            .field("generator", &self.generator.provider_id())
            .field("validator", &self.validator)
            .finish()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
