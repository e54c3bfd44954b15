//! Ollama-compatible embedding provider (local models)

pub mod embedding;
pub mod types;

pub use embedding::OllamaEmbeddingProvider;
