//! Wiring from config to providers, store, and orchestrator.

use mealwise_context::AdvisorOrchestrator;
use mealwise_core::{MealwiseConfig, MealwiseResult};
use mealwise_knowledge::{FoodKnowledgeStore, FoodSafetyApiClient, NutritionGateway};
use mealwise_llm::{ClovaGenerationProvider, OllamaEmbeddingProvider, ProviderRegistry};
use mealwise_storage::{LookupCache, SnapshotFiles};
use std::sync::Arc;

/// Register the providers the config enables.
///
/// Embedding needs `embedding.base_url`; generation needs
/// `generation.api_key`. Anything else stays unregistered.
pub fn build_registry(config: &MealwiseConfig) -> MealwiseResult<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();

    match OllamaEmbeddingProvider::from_config(&config.embedding)? {
        Some(provider) => {
            tracing::debug!(url = provider.base_url(), "Embedding backend configured");
            registry.register_embedding(Arc::new(provider));
        }
        None => tracing::info!("No embedding backend configured, similarity search disabled"),
    }

    if config.generation.api_key.is_empty() {
        tracing::debug!("No generation API key configured");
    } else {
        registry.register_generation(Arc::new(ClovaGenerationProvider::from_config(
            &config.generation,
        )?));
    }

    Ok(registry)
}

pub fn open_store(
    config: &MealwiseConfig,
    registry: &ProviderRegistry,
) -> MealwiseResult<FoodKnowledgeStore> {
    if config.nutrition_api.service_key.is_empty() {
        tracing::warn!("Nutrition API service key is empty, lookups will likely fail");
    }

    let source = FoodSafetyApiClient::from_config(&config.nutrition_api)?;
    let gateway = NutritionGateway::new(Arc::new(source), LookupCache::from_config(&config.cache));
    let opened = FoodKnowledgeStore::open(
        gateway,
        registry.embedding_opt(),
        SnapshotFiles::new(config.storage.embeddings_dir.clone()),
    );
    if let Some(cause) = opened.cause() {
        tracing::warn!(error = %cause, "Knowledge store opened empty");
    }
    Ok(opened.into_value())
}

pub fn open_advisor(
    config: &MealwiseConfig,
    registry: &ProviderRegistry,
) -> MealwiseResult<AdvisorOrchestrator> {
    let store = open_store(config, registry)?;
    AdvisorOrchestrator::from_registry(
        store,
        registry,
        &config.generation,
        config.retrieval.clone(),
    )
}
