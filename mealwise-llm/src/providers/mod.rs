//! HTTP provider implementations
//!
//! Concrete implementations of [`EmbeddingProvider`](crate::EmbeddingProvider)
//! and [`GenerationProvider`](crate::GenerationProvider).

pub mod clova;
pub mod ollama;

pub use clova::ClovaGenerationProvider;
pub use ollama::OllamaEmbeddingProvider;

use mealwise_core::{LlmError, MealwiseError};

pub(crate) fn request_failed(
    provider: &str,
    status: i32,
    message: impl Into<String>,
) -> MealwiseError {
    MealwiseError::Llm(LlmError::RequestFailed {
        provider: provider.to_string(),
        status,
        message: message.into(),
    })
}

pub(crate) fn invalid_response(provider: &str, reason: impl Into<String>) -> MealwiseError {
    MealwiseError::Llm(LlmError::InvalidResponse {
        provider: provider.to_string(),
        reason: reason.into(),
    })
}

/// Shared client with a total request timeout.
pub(crate) fn http_client(
    provider: &str,
    timeout: std::time::Duration,
) -> Result<reqwest::Client, MealwiseError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| request_failed(provider, 0, format!("Failed to build HTTP client: {}", e)))
}
