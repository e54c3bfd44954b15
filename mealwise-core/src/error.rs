//! Error types for Mealwise operations

use std::path::PathBuf;
use thiserror::Error;

/// On-disk storage errors (lookup cache and knowledge store files).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("Failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("Corrupt entry at {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// Nutrition lookup errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("Lookup transport to {source_name} failed: {message}")]
    Transport { source_name: String, message: String },

    #[error("Lookup to {source_name} returned status {status}: {message}")]
    Status {
        source_name: String,
        status: u16,
        message: String,
    },

    #[error("Lookup payload could not be decoded: {reason}")]
    Decode { reason: String },
}

/// LLM provider errors (embedding and generation).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("No {capability} provider configured")]
    ProviderNotConfigured { capability: String },

    #[error("Request to {provider} failed with status {status}: {message}")]
    RequestFailed {
        provider: String,
        status: i32,
        message: String,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Embedding failed: {reason}")]
    EmbeddingFailed { reason: String },

    #[error("Generation failed: {reason}")]
    GenerationFailed { reason: String },
}

/// Validation errors for generated documents and user input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Malformed JSON: {reason}")]
    MalformedJson { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read config file {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Failed to parse config: {reason}")]
    Parse { reason: String },
}

/// Vector operation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VectorError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Invalid vector: {reason}")]
    InvalidVector { reason: String },
}

/// Master error type for all Mealwise errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MealwiseError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),
}

/// Result type alias for Mealwise operations.
pub type MealwiseResult<T> = Result<T, MealwiseError>;

// =============================================================================
// TESTS
// =============================================================================
