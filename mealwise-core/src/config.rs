//! Configuration types
//!
//! Loaded from TOML; any section or field left out falls back to
//! [`MealwiseConfig::default_local`]. Secrets are normally supplied through
//! environment variables rather than the file.

use crate::{ConfigError, MealwiseResult, SamplingParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "MEALWISE_CONFIG";
pub const NUTRITION_API_KEY_ENV: &str = "MEALWISE_NUTRITION_API_KEY";
pub const CLOVA_API_KEY_ENV: &str = "MEALWISE_CLOVA_API_KEY";
pub const CLOVA_APIGW_KEY_ENV: &str = "MEALWISE_CLOVA_APIGW_KEY";
pub const CLOVA_REQUEST_ID_ENV: &str = "MEALWISE_CLOVA_REQUEST_ID";
pub const EMBEDDING_URL_ENV: &str = "MEALWISE_EMBEDDING_URL";

/// On-disk lookup cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub dir: PathBuf,
    /// Time-to-live for cached lookups, in seconds
    pub ttl_secs: u64,
    /// Maximum number of cache files kept on disk
    pub max_entries: usize,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("cache"),
            ttl_secs: 3600,
            max_entries: 1000,
        }
    }
}

/// External nutrition lookup API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NutritionApiConfig {
    pub base_url: String,
    pub endpoint: String,
    pub service_key: String,
    pub rows_per_page: u32,
    pub page: u32,
    pub timeout_secs: u64,
}

impl NutritionApiConfig {
    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NutritionApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://apis.data.go.kr/1471000/FoodNtrCpntDbInfo02".to_string(),
            endpoint: "/getFoodNtrCpntDbInq02".to_string(),
            service_key: String::new(),
            rows_per_page: 10,
            page: 1,
            timeout_secs: 10,
        }
    }
}

/// Generative service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub apigw_key: String,
    pub request_id: String,
    pub sampling: SamplingParams,
    pub include_ai_filters: bool,
    pub timeout_secs: u64,
    /// Attempts the recipe validator makes before giving up
    pub max_attempts: u32,
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://clovastudio.stream.ntruss.com".to_string(),
            model: "HCX-005".to_string(),
            api_key: String::new(),
            apigw_key: String::new(),
            request_id: String::new(),
            sampling: SamplingParams::default(),
            include_ai_filters: true,
            timeout_secs: 30,
            max_attempts: 3,
        }
    }
}

/// Embedding backend settings. No `base_url` means no backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingConfig {
    pub base_url: Option<String>,
    pub model: String,
    pub dimensions: usize,
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: "paraphrase-multilingual".to_string(),
            dimensions: 384,
            timeout_secs: 30,
        }
    }
}

/// Similarity search and context assembly settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrievalConfig {
    pub similarity_threshold: f32,
    /// Neighbors requested from the similarity index (top-k)
    pub max_results: usize,
    /// Facts listed in a prompt context block
    pub context_facts: usize,
    /// Neighbors listed in a prompt context block
    pub context_neighbors: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.7,
            max_results: 5,
            context_facts: 3,
            context_neighbors: 3,
        }
    }
}

/// Knowledge store persistence settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub embeddings_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            embeddings_dir: PathBuf::from("embeddings"),
        }
    }
}

/// Master configuration struct.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MealwiseConfig {
    pub cache: CacheConfig,
    pub nutrition_api: NutritionApiConfig,
    pub generation: GenerationConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub storage: StorageConfig,
}

impl MealwiseConfig {
    /// Defaults suitable for a local run from the working directory.
    pub fn default_local() -> Self {
        Self::default()
    }

    /// Parse a TOML document.
    pub fn from_toml_str(contents: &str) -> MealwiseResult<Self> {
        toml::from_str(contents).map_err(|e| {
            ConfigError::Parse {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Read and parse a TOML file.
    pub fn from_path(path: &Path) -> MealwiseResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load from an explicit path, else `MEALWISE_CONFIG`, else defaults;
    /// then apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> MealwiseResult<Self> {
        let env_path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_path(&path)?,
            None => Self::default_local(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlay secrets and endpoints from the environment.
    ///
    /// `lookup` is injected so tests do not touch the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(NUTRITION_API_KEY_ENV) {
            self.nutrition_api.service_key = key;
        }
        if let Some(key) = lookup(CLOVA_API_KEY_ENV) {
            self.generation.api_key = key;
        }
        if let Some(key) = lookup(CLOVA_APIGW_KEY_ENV) {
            self.generation.apigw_key = key;
        }
        if let Some(id) = lookup(CLOVA_REQUEST_ID_ENV) {
            self.generation.request_id = id;
        }
        if let Some(url) = lookup(EMBEDDING_URL_ENV) {
            self.embedding.base_url = Some(url).filter(|u| !u.trim().is_empty());
        }
    }

    /// Validate the configuration.
    /// Returns Ok(()) if valid, Err(MealwiseError::Config) if invalid.
    ///
    /// Secrets are not required here: a missing key surfaces as a failed
    /// (and logged) external call, not a startup failure.
    pub fn validate(&self) -> MealwiseResult<()> {
        if self.cache.ttl_secs == 0 {
            return Err(invalid("cache.ttl_secs", self.cache.ttl_secs, "must be positive"));
        }
        if self.cache.max_entries == 0 {
            return Err(invalid(
                "cache.max_entries",
                self.cache.max_entries,
                "must be positive",
            ));
        }
        if self.cache.dir.as_os_str().is_empty() {
            return Err(invalid("cache.dir", "", "must not be empty"));
        }
        if self.nutrition_api.base_url.trim().is_empty() {
            return Err(invalid("nutrition_api.base_url", "", "must not be empty"));
        }
        if self.nutrition_api.timeout_secs == 0 || self.nutrition_api.timeout_secs > 10 {
            return Err(invalid(
                "nutrition_api.timeout_secs",
                self.nutrition_api.timeout_secs,
                "must be between 1 and 10",
            ));
        }
        if self.nutrition_api.rows_per_page == 0 {
            return Err(invalid(
                "nutrition_api.rows_per_page",
                self.nutrition_api.rows_per_page,
                "must be positive",
            ));
        }
        if self.generation.max_attempts == 0 {
            return Err(invalid(
                "generation.max_attempts",
                self.generation.max_attempts,
                "must be at least 1",
            ));
        }
        if self.generation.timeout_secs == 0 {
            return Err(invalid(
                "generation.timeout_secs",
                self.generation.timeout_secs,
                "must be positive",
            ));
        }
        if self.generation.sampling.max_tokens <= 0 {
            return Err(invalid(
                "generation.sampling.max_tokens",
                self.generation.sampling.max_tokens,
                "must be positive",
            ));
        }
        let threshold = self.retrieval.similarity_threshold;
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(invalid(
                "retrieval.similarity_threshold",
                threshold,
                "must be between -1.0 and 1.0",
            ));
        }
        if self.retrieval.max_results == 0 {
            return Err(invalid(
                "retrieval.max_results",
                self.retrieval.max_results,
                "must be positive",
            ));
        }
        if self.embedding.dimensions == 0 {
            return Err(invalid(
                "embedding.dimensions",
                self.embedding.dimensions,
                "must be positive",
            ));
        }
        if self.storage.embeddings_dir.as_os_str().is_empty() {
            return Err(invalid("storage.embeddings_dir", "", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> crate::MealwiseError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

// =============================================================================
// TESTS
// =============================================================================
