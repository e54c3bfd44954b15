//! Mealwise Knowledge
//!
//! Everything the advisor knows about food:
//!
//! - [`NutritionGateway`]: cache-or-fetch nutrition facts for a food name.
//! - [`SimilarityIndex`]: cosine ranking over stored food embeddings.
//! - [`FoodKnowledgeStore`]: the persisted union of both, grown one food
//!   at a time.

pub mod gateway;
pub mod index;
pub mod source;
pub mod store;

pub use gateway::{normalize, NutritionGateway};
pub use index::{Neighbor, SimilarityIndex};
pub use source::{FoodSafetyApiClient, NutritionSource, StaticNutritionSource};
pub use store::{AddFoodOutcome, FoodKnowledgeStore};
