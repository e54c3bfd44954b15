//! Ollama embedding provider implementation

use super::types::{EmbeddingRequest, EmbeddingResponse};
use crate::providers::{http_client, invalid_response, request_failed};
use crate::EmbeddingProvider;
use async_trait::async_trait;
use mealwise_core::{EmbeddingConfig, EmbeddingVector, MealwiseResult, VectorError};
use reqwest::Client;

const PROVIDER: &str = "ollama";

/// Embedding provider backed by an Ollama-compatible `/api/embeddings` endpoint.
pub struct OllamaEmbeddingProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbeddingProvider {
    /// # Arguments
    /// * `base_url` - Server URL (e.g., "http://localhost:11434")
    /// * `model` - Model name (e.g., "paraphrase-multilingual")
    /// * `dimensions` - Expected vector length; other lengths are rejected
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
        timeout: std::time::Duration,
    ) -> MealwiseResult<Self> {
        Ok(Self {
            client: http_client(PROVIDER, timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            dimensions,
        })
    }

    /// Build from config. `None` when no embedding endpoint is configured.
    pub fn from_config(config: &EmbeddingConfig) -> MealwiseResult<Option<Self>> {
        match &config.base_url {
            Some(url) if !url.trim().is_empty() => Ok(Some(Self::new(
                url.clone(),
                config.model.clone(),
                config.dimensions,
                config.timeout(),
            )?)),
            _ => Ok(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> MealwiseResult<EmbeddingVector> {
        let request = EmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let url = format!("{}/api/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_failed(PROVIDER, 0, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(request_failed(PROVIDER, status.as_u16() as i32, error_text));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| invalid_response(PROVIDER, format!("Failed to parse response: {}", e)))?;

        if body.embedding.len() != self.dimensions {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimensions,
                got: body.embedding.len(),
            }
            .into());
        }

        let vector = EmbeddingVector::new(body.embedding, self.model.clone());
        if !vector.is_valid() {
            return Err(VectorError::InvalidVector {
                reason: "embedding contains non-finite values".to_string(),
            }
            .into());
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

impl std::fmt::Debug for OllamaEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaEmbeddingProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}
