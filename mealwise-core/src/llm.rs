//! LLM-related primitive types.
//!
//! Pure data types for generation requests. Traits and orchestration live in mealwise-llm.

use serde::{Deserialize, Serialize};

// ============================================================================
// SAMPLING PARAMETERS
// ============================================================================

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    pub top_p: f32,
    pub top_k: i32,
    pub max_tokens: i32,
    pub temperature: f32,
    pub repeat_penalty: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            top_p: 0.8,
            top_k: 0,
            max_tokens: 1000,
            temperature: 0.7,
            repeat_penalty: 5.0,
        }
    }
}

// ============================================================================
// GENERATION REQUEST
// ============================================================================

/// A single text-in/text-out request to a generative service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// System instruction (persona and rules)
    pub system: String,
    /// User prompt
    pub prompt: String,
    pub sampling: SamplingParams,
    /// Ask the provider to run its safety filters on the output
    pub include_ai_filters: bool,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            sampling: SamplingParams::default(),
            include_ai_filters: true,
        }
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_ai_filters(mut self, enabled: bool) -> Self {
        self.include_ai_filters = enabled;
        self
    }
}
