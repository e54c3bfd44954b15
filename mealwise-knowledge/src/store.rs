//! Persistent food knowledge: nutrition facts plus embeddings, grown by
//! [`FoodKnowledgeStore::add_food`] and flushed after every addition.

use crate::gateway::NutritionGateway;
use crate::index::{Neighbor, SimilarityIndex};
use mealwise_core::{FoodEmbedding, MealwiseResult, NutritionFact, Outcome};
use mealwise_llm::EmbeddingProvider;
use mealwise_storage::{KnowledgeSnapshot, SnapshotFiles};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// What [`FoodKnowledgeStore::add_food`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AddFoodOutcome {
    /// The name was already stored; nothing was fetched.
    AlreadyKnown,
    /// The lookup produced no facts; the store is unchanged.
    NoFacts,
    Added {
        facts: usize,
        /// An embedding was computed and indexed
        embedded: bool,
        /// Both snapshot files were written
        persisted: bool,
    },
}

pub struct FoodKnowledgeStore {
    gateway: NutritionGateway,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    index: SimilarityIndex,
    facts: BTreeMap<String, Vec<NutritionFact>>,
    files: SnapshotFiles,
}

impl FoodKnowledgeStore {
    /// Open the store, loading whatever snapshot `files` holds.
    ///
    /// An unusable snapshot degrades to an empty store rather than failing.
    pub fn open(
        gateway: NutritionGateway,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        files: SnapshotFiles,
    ) -> Outcome<Self> {
        files.load().map(|snapshot| Self {
            gateway,
            embedder,
            index: SimilarityIndex::from_entries(snapshot.embeddings),
            facts: snapshot.facts,
            files,
        })
    }

    pub fn gateway(&self) -> &NutritionGateway {
        &self.gateway
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.facts.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn facts_for(&self, name: &str) -> Option<&[NutritionFact]> {
        self.facts.get(name).map(Vec::as_slice)
    }

    /// Cache-or-fetch nutrition facts without touching the store.
    pub async fn lookup(&self, name: &str, use_cache: bool) -> Outcome<Vec<NutritionFact>> {
        self.gateway.fetch(name, use_cache).await
    }

    /// Learn a new food.
    ///
    /// Known names return at once. Otherwise the facts are fetched; with
    /// none, the store is left untouched. An embedding is computed when a
    /// backend is available (failures only skip the embedding), then both
    /// maps are updated and persisted together.
    pub async fn add_food(&mut self, name: &str) -> AddFoodOutcome {
        if self.contains(name) {
            tracing::debug!(food = %name, "Food already known");
            return AddFoodOutcome::AlreadyKnown;
        }

        let facts = self.gateway.fetch(name, true).await.into_value();
        if facts.is_empty() {
            tracing::info!(food = %name, "No nutrition facts found, not adding");
            return AddFoodOutcome::NoFacts;
        }

        let embedded = match self.embed(name).await {
            Some(vector) => self.index.add_embedding(FoodEmbedding {
                name: name.to_string(),
                vector,
            }),
            None => false,
        };

        let count = facts.len();
        self.facts.insert(name.to_string(), facts);

        let persisted = match self.save() {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(food = %name, error = %e, "Failed to persist knowledge store");
                false
            }
        };

        tracing::info!(food = %name, facts = count, embedded, persisted, "Added food");
        AddFoodOutcome::Added {
            facts: count,
            embedded,
            persisted,
        }
    }

    /// Stored foods most similar to `query`.
    ///
    /// Empty when the index is empty, no embedding backend is configured, or
    /// embedding fails. An empty index never reaches the backend.
    pub async fn find_similar(&self, query: &str, top_k: usize, threshold: f32) -> Vec<Neighbor> {
        if self.index.is_empty() {
            return Vec::new();
        }
        match self.embed(query).await {
            Some(vector) => self.index.query(&vector.data, top_k, threshold),
            None => Vec::new(),
        }
    }

    async fn embed(&self, text: &str) -> Option<mealwise_core::EmbeddingVector> {
        let embedder = self.embedder.as_ref()?;
        match embedder.embed(text).await {
            Ok(vector) => Some(vector),
            Err(e) => {
                tracing::warn!(
                    text = %text,
                    model = embedder.model_id(),
                    error = %e,
                    "Embedding failed"
                );
                None
            }
        }
    }

    pub fn snapshot(&self) -> KnowledgeSnapshot {
        KnowledgeSnapshot {
            embeddings: self.index.entries().clone(),
            facts: self.facts.clone(),
        }
    }

    /// Write both snapshot files.
    pub fn save(&self) -> MealwiseResult<()> {
        self.files.save(&self.snapshot())
    }
}

impl std::fmt::Debug for FoodKnowledgeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FoodKnowledgeStore")
            .field("foods", &self.facts.len())
            .field("embeddings", &self.index.len())
            .field("embedder", &self.embedder.as_ref().map(|e| e.model_id().to_string()))
            .field("dir", &self.files.dir())
            .finish()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
