//! Mealwise LLM - Provider Abstraction Layer
//!
//! Provider-agnostic traits for embeddings and text generation, the
//! registry that hands them out, deterministic mocks, HTTP adapters, and
//! the generate-validate-retry loop that turns unreliable generative
//! output into a [`ValidatedRecipe`].
//!
//! [`ValidatedRecipe`]: mealwise_core::ValidatedRecipe

use async_trait::async_trait;
use mealwise_core::{
    EmbeddingVector, GenerationRequest, LlmError, MealwiseError, MealwiseResult,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub mod providers;
pub mod validator;

pub use providers::{ClovaGenerationProvider, OllamaEmbeddingProvider};
pub use validator::{strip_fences, validate_recipe, GenerationValidator};

// ============================================================================
// EMBEDDING PROVIDER TRAIT
// ============================================================================

/// Text to fixed-length vector.
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    ///
    /// # Returns
    /// * `Ok(EmbeddingVector)` - The embedding vector
    /// * `Err(MealwiseError::Llm)` - If the backend fails
    async fn embed(&self, text: &str) -> MealwiseResult<EmbeddingVector>;

    /// Number of dimensions this provider produces.
    fn dimensions(&self) -> usize;

    /// Model identifier (e.g., "paraphrase-multilingual").
    fn model_id(&self) -> &str;
}

// ============================================================================
// GENERATION PROVIDER TRAIT
// ============================================================================

/// Instruction plus prompt in, free text out.
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Run one completion and return the raw model text.
    ///
    /// The text is returned exactly as produced; no trimming or fence
    /// stripping happens here.
    async fn complete(&self, request: &GenerationRequest) -> MealwiseResult<String>;

    /// Identifier used in logs and errors (e.g., "clova").
    fn provider_id(&self) -> &str;
}

// ============================================================================
// PROVIDER REGISTRY
// ============================================================================

/// Registry for LLM providers.
/// Providers must be explicitly registered - no auto-discovery.
pub struct ProviderRegistry {
    embedding: Option<Arc<dyn EmbeddingProvider>>,
    generation: Option<Arc<dyn GenerationProvider>>,
}

impl ProviderRegistry {
    /// Create a new empty provider registry.
    pub fn new() -> Self {
        Self {
            embedding: None,
            generation: None,
        }
    }

    /// Register an embedding provider, replacing any previous one.
    pub fn register_embedding(&mut self, provider: Arc<dyn EmbeddingProvider>) {
        self.embedding = Some(provider);
    }

    /// Register a generation provider, replacing any previous one.
    pub fn register_generation(&mut self, provider: Arc<dyn GenerationProvider>) {
        self.generation = Some(provider);
    }

    /// Get the registered embedding provider.
    ///
    /// # Returns
    /// * `Err(MealwiseError::Llm(LlmError::ProviderNotConfigured))` - If none registered
    pub fn embedding(&self) -> MealwiseResult<Arc<dyn EmbeddingProvider>> {
        self.embedding
            .clone()
            .ok_or_else(|| not_configured("embedding"))
    }

    /// Get the registered generation provider.
    ///
    /// # Returns
    /// * `Err(MealwiseError::Llm(LlmError::ProviderNotConfigured))` - If none registered
    pub fn generation(&self) -> MealwiseResult<Arc<dyn GenerationProvider>> {
        self.generation
            .clone()
            .ok_or_else(|| not_configured("generation"))
    }

    /// Embedding provider if one is registered.
    pub fn embedding_opt(&self) -> Option<Arc<dyn EmbeddingProvider>> {
        self.embedding.clone()
    }

    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }

    pub fn has_generation(&self) -> bool {
        self.generation.is_some()
    }

    pub fn clear_embedding(&mut self) {
        self.embedding = None;
    }

    pub fn clear_generation(&mut self) {
        self.generation = None;
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("embedding", &self.embedding.as_ref().map(|p| p.model_id().to_string()))
            .field("generation", &self.generation.as_ref().map(|p| p.provider_id().to_string()))
            .finish()
    }
}

fn not_configured(capability: &str) -> MealwiseError {
    MealwiseError::Llm(LlmError::ProviderNotConfigured {
        capability: capability.to_string(),
    })
}

// ============================================================================
// MOCK PROVIDERS FOR TESTING
// ============================================================================

/// Mock embedding provider for testing.
/// Generates deterministic embeddings based on text content.
#[derive(Debug)]
pub struct MockEmbeddingProvider {
    model_id: String,
    dimensions: usize,
    calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    pub fn new(model_id: impl Into<String>, dimensions: usize) -> Self {
        Self {
            model_id: model_id.into(),
            dimensions: dimensions.max(1),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Byte-bucketed vector, normalized to unit length.
    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut data = vec![0.0f32; self.dimensions];

        for (i, byte) in text.bytes().enumerate() {
            let idx = i % self.dimensions;
            data[idx] += (byte as f32) / 255.0;
        }

        let norm: f32 = data.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut data {
                *x /= norm;
            }
        }

        data
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> MealwiseResult<EmbeddingVector> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(EmbeddingVector::new(
            self.generate_embedding(text),
            self.model_id.clone(),
        ))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Embedding provider that always fails.
#[derive(Debug, Default)]
pub struct FailingEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for FailingEmbeddingProvider {
    async fn embed(&self, _text: &str) -> MealwiseResult<EmbeddingVector> {
        Err(MealwiseError::Llm(LlmError::EmbeddingFailed {
            reason: "embedding backend unavailable".to_string(),
        }))
    }

    fn dimensions(&self) -> usize {
        0
    }

    fn model_id(&self) -> &str {
        "failing"
    }
}

/// Mock generation provider that replays a script of responses.
///
/// Each `complete` call pops the next scripted result. Once the script is
/// exhausted every call fails with `LlmError::GenerationFailed`.
#[derive(Debug, Default)]
pub struct MockGenerationProvider {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that answers with each text in order.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new();
        for response in responses {
            provider.push_response(response);
        }
        provider
    }

    pub fn push_response(&self, text: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Ok(text.into()));
        }
    }

    pub fn push_failure(&self, error: LlmError) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(error));
        }
    }

    /// Number of `complete` calls received.
    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    async fn complete(&self, request: &GenerationRequest) -> MealwiseResult<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(e)) => Err(e.into()),
            None => Err(LlmError::GenerationFailed {
                reason: "mock script exhausted".to_string(),
            }
            .into()),
        }
    }

    fn provider_id(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_registry_new_is_empty() {
        let registry = ProviderRegistry::new();
        assert!(!registry.has_embedding());
        assert!(!registry.has_generation());
        assert!(registry.embedding_opt().is_none());
    }

    #[test]
    fn test_provider_registry_register_and_clear() {
        let mut registry = ProviderRegistry::new();
        registry.register_embedding(Arc::new(MockEmbeddingProvider::new("test", 8)));
        registry.register_generation(Arc::new(MockGenerationProvider::new()));
        assert!(registry.has_embedding());
        assert!(registry.has_generation());

        registry.clear_embedding();
        assert!(!registry.has_embedding());
        assert!(registry.has_generation());

        registry.clear_generation();
        assert!(!registry.has_generation());
    }

    #[test]
    fn test_registry_reports_missing_capability() {
        let registry = ProviderRegistry::new();
        match registry.generation() {
            Err(MealwiseError::Llm(LlmError::ProviderNotConfigured { capability })) => {
                assert_eq!(capability, "generation");
            }
            other => panic!("expected ProviderNotConfigured, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_mock_embedding_provider_embed() {
        let provider = MockEmbeddingProvider::new("test-model", 16);
        let embedding = provider.embed("kimchi").await.unwrap();
        assert_eq!(embedding.dimensions(), 16);
        assert_eq!(embedding.model_id, "test-model");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_embedding_provider_is_unit_length() {
        let provider = MockEmbeddingProvider::new("test-model", 16);
        let embedding = provider.embed("bibimbap").await.unwrap();
        let norm: f32 = embedding.data.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_failing_embedding_provider() {
        let err = FailingEmbeddingProvider.embed("x").await.unwrap_err();
        assert!(matches!(
            err,
            MealwiseError::Llm(LlmError::EmbeddingFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_mock_generation_replays_script() {
        let provider = MockGenerationProvider::with_responses(["first", "second"]);
        provider.push_failure(LlmError::GenerationFailed {
            reason: "boom".to_string(),
        });
        let request = GenerationRequest::new("sys", "prompt");

        assert_eq!(provider.complete(&request).await.unwrap(), "first");
        assert_eq!(provider.complete(&request).await.unwrap(), "second");
        assert!(provider.complete(&request).await.is_err());
        assert!(provider.complete(&request).await.is_err());
        assert_eq!(provider.calls(), 4);
        assert_eq!(provider.requests()[0].prompt, "prompt");
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// An empty registry never hands out an embedding provider.
        #[test]
        fn prop_registry_returns_error_when_embedding_not_configured(_seed in 0u64..1000u64) {
            let registry = ProviderRegistry::new();
            let is_not_configured = matches!(
                registry.embedding(),
                Err(MealwiseError::Llm(LlmError::ProviderNotConfigured { .. }))
            );
            prop_assert!(is_not_configured);
        }

        /// After registration the same provider comes back.
        #[test]
        fn prop_registry_returns_ok_when_embedding_configured(
            dimensions in 1usize..1024,
            model_id in "[a-z]{1,20}"
        ) {
            let mut registry = ProviderRegistry::new();
            registry.register_embedding(Arc::new(MockEmbeddingProvider::new(model_id.clone(), dimensions)));

            let provider = registry.embedding().unwrap();
            prop_assert_eq!(provider.dimensions(), dimensions);
            prop_assert_eq!(provider.model_id(), model_id.as_str());
        }

        /// Mock embeddings are deterministic and correctly sized.
        #[test]
        fn prop_mock_embedding_deterministic(
            dimensions in 1usize..512,
            text in ".{1,100}"
        ) {
            let provider = MockEmbeddingProvider::new("test", dimensions);
            let e1 = block_on(provider.embed(&text)).unwrap();
            let e2 = block_on(provider.embed(&text)).unwrap();

            prop_assert_eq!(e1.dimensions(), dimensions);
            prop_assert_eq!(e1.data, e2.data);
        }
    }
}
