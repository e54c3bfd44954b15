//! Mealwise Core - Entity Types
//!
//! Pure data structures shared by every Mealwise crate: nutrition facts,
//! embeddings, cache entries, recipe documents, errors, and configuration.
//! This crate performs no network or disk I/O apart from reading config files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod nutrition;
pub mod outcome;
pub mod recipe;

pub use config::{
    CacheConfig, EmbeddingConfig, GenerationConfig, MealwiseConfig, NutritionApiConfig,
    RetrievalConfig, StorageConfig,
};
pub use embedding::{cosine_similarity, EmbeddingVector, FoodEmbedding};
pub use error::{
    ConfigError, LlmError, LookupError, MealwiseError, MealwiseResult, StorageError,
    ValidationError, VectorError,
};
pub use llm::{GenerationRequest, SamplingParams};
pub use nutrition::NutritionFact;
pub use outcome::Outcome;
pub use recipe::{PantryItem, RecipeIngredient, UserPreferences, ValidatedRecipe, NO_PREFERENCE};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// SHA-256 content hash.
pub type ContentHash = [u8; 32];

/// Compute SHA-256 hash of content.
pub fn compute_content_hash(content: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

// ============================================================================
// CACHE ENTRY
// ============================================================================

/// A timestamped lookup payload stored under a normalized key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub timestamp: Timestamp,
    pub payload: serde_json::Value,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, timestamp: Timestamp, payload: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            timestamp,
            payload,
        }
    }

    /// `now - timestamp < ttl`.
    ///
    /// An entry stamped in the future (clock skew) counts as fresh.
    pub fn is_fresh(&self, now: Timestamp, ttl: Duration) -> bool {
        match (now - self.timestamp).to_std() {
            Ok(age) => age < ttl,
            Err(_) => true,
        }
    }

    /// Age of the entry relative to `now`, saturating at zero.
    pub fn age(&self, now: Timestamp) -> Duration {
        (now - self.timestamp).to_std().unwrap_or(Duration::ZERO)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_compute_content_hash_is_deterministic() {
        let a = compute_content_hash(b"kimchi");
        let b = compute_content_hash(b"kimchi");
        let c = compute_content_hash(b"bibimbap");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_cache_entry_fresh_before_ttl() {
        let t0 = Utc::now();
        let entry = CacheEntry::new("kimchi", t0, json!({}));
        let ttl = Duration::from_secs(3600);
        assert!(entry.is_fresh(t0, ttl));
        assert!(entry.is_fresh(t0 + chrono::Duration::seconds(3599), ttl));
    }

    #[test]
    fn test_cache_entry_stale_at_ttl() {
        let t0 = Utc::now();
        let entry = CacheEntry::new("kimchi", t0, json!({}));
        let ttl = Duration::from_secs(3600);
        assert!(!entry.is_fresh(t0 + chrono::Duration::seconds(3600), ttl));
        assert!(!entry.is_fresh(t0 + chrono::Duration::seconds(7200), ttl));
    }

    #[test]
    fn test_cache_entry_age_saturates() {
        let t0 = Utc::now();
        let entry = CacheEntry::new("kimchi", t0, json!({}));
        assert_eq!(entry.age(t0 - chrono::Duration::seconds(5)), Duration::ZERO);
        assert_eq!(
            entry.age(t0 + chrono::Duration::seconds(5)),
            Duration::from_secs(5)
        );
    }
}
