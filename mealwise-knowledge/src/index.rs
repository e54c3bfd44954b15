//! Cosine-similarity ranking over named food embeddings.

use mealwise_core::{cosine_similarity, EmbeddingVector, FoodEmbedding};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A ranked match from [`SimilarityIndex::query`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub name: String,
    pub score: f32,
}

/// Name-keyed embedding set. The first vector stored under a name wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityIndex {
    entries: BTreeMap<String, EmbeddingVector>,
}

impl SimilarityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: BTreeMap<String, EmbeddingVector>) -> Self {
        Self { entries }
    }

    /// Store `vector` under `name`. Returns false if the name already exists.
    pub fn add(&mut self, name: impl Into<String>, vector: EmbeddingVector) -> bool {
        match self.entries.entry(name.into()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(vector);
                true
            }
        }
    }

    pub fn add_embedding(&mut self, embedding: FoodEmbedding) -> bool {
        self.add(embedding.name, embedding.vector)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&EmbeddingVector> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &BTreeMap<String, EmbeddingVector> {
        &self.entries
    }

    /// Rank stored entries against `query`.
    ///
    /// Scores are sorted descending, cut to `top_k`, and only then filtered
    /// by `threshold`, so fewer than `top_k` results may come back even when
    /// lower-ranked entries would have passed. Entries whose dimensions
    /// differ from the query are skipped.
    pub fn query(&self, query: &[f32], top_k: usize, threshold: f32) -> Vec<Neighbor> {
        let mut scored: Vec<Neighbor> = self
            .entries
            .iter()
            .filter_map(|(name, vector)| match cosine_similarity(query, &vector.data) {
                Ok(score) => Some(Neighbor {
                    name: name.clone(),
                    score,
                }),
                Err(e) => {
                    tracing::warn!(food = %name, error = %e, "Skipping incomparable embedding");
                    None
                }
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);
        scored.retain(|n| n.score >= threshold);
        scored
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(data: &[f32]) -> EmbeddingVector {
        EmbeddingVector::new(data.to_vec(), "test")
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = SimilarityIndex::new();
        assert!(index.query(&[1.0, 0.0], 5, 0.0).is_empty());
    }

    #[test]
    fn test_orthogonal_vectors_filtered_by_threshold() {
        let mut index = SimilarityIndex::new();
        index.add("A", vector(&[1.0, 0.0]));
        index.add("B", vector(&[0.0, 1.0]));

        let all = index.query(&[1.0, 0.0], 2, -1.0);
        assert_eq!(all.len(), 2);
        assert!((all[0].score - 1.0).abs() < 1e-6);
        assert!(all[1].score.abs() < 1e-6);

        let hits = index.query(&[1.0, 0.0], 2, 0.5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "A");
    }

    #[test]
    fn test_truncates_before_filtering() {
        let mut index = SimilarityIndex::new();
        index.add("A", vector(&[1.0, 0.0]));
        index.add("B", vector(&[0.9, 0.1]));
        index.add("C", vector(&[0.0, 1.0]));

        let hits = index.query(&[1.0, 0.0], 1, 0.5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "A");
    }

    #[test]
    fn test_first_write_wins() {
        let mut index = SimilarityIndex::new();
        assert!(index.add("kimchi", vector(&[1.0, 0.0])));
        assert!(!index.add("kimchi", vector(&[0.0, 1.0])));
        assert_eq!(index.get("kimchi").unwrap().data, vec![1.0, 0.0]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_dimension_mismatch_is_skipped() {
        let mut index = SimilarityIndex::new();
        index.add("A", vector(&[1.0, 0.0]));
        index.add("B", vector(&[1.0, 0.0, 0.0]));

        let hits = index.query(&[1.0, 0.0], 5, 0.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "A");
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_entries() -> impl Strategy<Value = Vec<(String, Vec<f32>)>> {
        prop::collection::vec(
            ("[a-z]{1,8}", prop::collection::vec(-1.0f32..1.0, 4)),
            0..20,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Results are sorted, bounded by top_k, and all pass the threshold.
        #[test]
        fn prop_query_sorted_bounded_filtered(
            entries in arb_entries(),
            query in prop::collection::vec(-1.0f32..1.0, 4),
            top_k in 0usize..10,
            threshold in -1.0f32..1.0
        ) {
            let mut index = SimilarityIndex::new();
            for (name, data) in entries {
                index.add(name, EmbeddingVector::new(data, "test"));
            }

            let hits = index.query(&query, top_k, threshold);
            prop_assert!(hits.len() <= top_k);
            prop_assert!(hits.iter().all(|n| n.score >= threshold));
            prop_assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }
}
