//! Embedding vector operations

use crate::{MealwiseResult, VectorError};
use serde::{Deserialize, Serialize};

/// Embedding vector with dynamic dimensions.
/// Supports any embedding model dimension (e.g., 384, 768, 1536).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector {
    /// The embedding data as a vector of f32 values.
    pub data: Vec<f32>,
    /// Identifier of the model that produced this embedding.
    pub model_id: String,
}

impl EmbeddingVector {
    /// Create a new embedding vector.
    pub fn new(data: Vec<f32>, model_id: impl Into<String>) -> Self {
        Self {
            data,
            model_id: model_id.into(),
        }
    }

    /// Number of dimensions.
    pub fn dimensions(&self) -> usize {
        self.data.len()
    }

    /// Compute cosine similarity `dot(a,b) / (|a||b|)` between two vectors.
    ///
    /// A zero-norm operand yields 0.0 rather than NaN.
    pub fn cosine_similarity(&self, other: &EmbeddingVector) -> MealwiseResult<f32> {
        cosine_similarity(&self.data, &other.data)
    }

    /// Check that the vector is non-empty and contains only finite values.
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty() && self.data.iter().all(|x| x.is_finite())
    }
}

/// Cosine similarity over raw slices.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> MealwiseResult<f32> {
    if a.len() != b.len() {
        return Err(VectorError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        }
        .into());
    }

    let mut dot_product = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let norm_a = norm_a.sqrt();
    let norm_b = norm_b.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (norm_a * norm_b))
}

/// A food name paired with its embedding. The name is the unique key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEmbedding {
    pub name: String,
    pub vector: EmbeddingVector,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MealwiseError;

    #[test]
    fn test_new_sets_dimensions() {
        let data = vec![0.0, 1.0, 0.5];
        let vec = EmbeddingVector::new(data.clone(), "model");
        assert_eq!(vec.dimensions(), 3);
        assert_eq!(vec.data, data);
        assert_eq!(vec.model_id, "model");
    }

    #[test]
    fn test_is_valid_rejects_empty_and_nan() {
        assert!(EmbeddingVector::new(vec![0.0, 1.0], "m").is_valid());
        assert!(!EmbeddingVector::new(vec![], "m").is_valid());
        assert!(!EmbeddingVector::new(vec![f32::NAN, 1.0], "m").is_valid());
    }

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let a = EmbeddingVector::new(vec![1.0, 0.0, 0.0], "model");
        let b = EmbeddingVector::new(vec![1.0, 0.0, 0.0], "model");
        let sim = a.cosine_similarity(&b).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_vectors() {
        let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector_returns_zero() {
        let sim = cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap();
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn test_cosine_similarity_dimension_mismatch() {
        let err = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            MealwiseError::Vector(VectorError::DimensionMismatch { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn test_cosine_similarity_opposite_and_scaled() {
        let opposite = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).unwrap();
        assert!((opposite + 1.0).abs() < 1e-6);

        let scaled = cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((scaled - 1.0).abs() < 1e-6);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Cosine similarity is symmetric and bounded to [-1, 1].
        #[test]
        fn prop_cosine_symmetric_and_bounded(
            pairs in prop::collection::vec((-100.0f32..100.0, -100.0f32..100.0), 1..32)
        ) {
            let a: Vec<f32> = pairs.iter().map(|(x, _)| *x).collect();
            let b: Vec<f32> = pairs.iter().map(|(_, y)| *y).collect();

            let ab = cosine_similarity(&a, &b).unwrap();
            let ba = cosine_similarity(&b, &a).unwrap();

            prop_assert!((ab - ba).abs() < 1e-4);
            prop_assert!(ab <= 1.0 + 1e-4);
            prop_assert!(ab >= -1.0 - 1e-4);
        }
    }
}
