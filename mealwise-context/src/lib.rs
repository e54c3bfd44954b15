//! Mealwise Context - Advisor Orchestration
//!
//! Turns retrieval results into prompts and prompts into answers:
//! free-text nutrition advice from a single generation call, and
//! structured recipes through the validated retry loop.

pub mod orchestrator;
pub mod preferences;
pub mod prompts;

pub use orchestrator::{
    AdviceResponse, AdvisorOrchestrator, RecipeRequest, RecipeResponse, RECIPE_FAILED_MESSAGE,
};
pub use preferences::{load_pantry, load_preferences, preferences_from_value};
pub use prompts::{build_context_block, ADVICE_SYSTEM_PROMPT};
