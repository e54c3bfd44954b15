//! External nutrition lookup sources.

use async_trait::async_trait;
use mealwise_core::{LookupError, MealwiseResult, NutritionApiConfig};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Raw nutrition lookup by food name.
///
/// Implementations return the provider's response body undecoded; the
/// gateway caches it verbatim and normalizes it afterwards.
#[async_trait]
pub trait NutritionSource: Send + Sync {
    async fn lookup(&self, food_name: &str) -> MealwiseResult<Value>;

    /// Name used in logs and errors.
    fn source_name(&self) -> &str;
}

// ============================================================================
// FOOD SAFETY NUTRIENT DATABASE CLIENT
// ============================================================================

const SOURCE_NAME: &str = "food-nutrient-db";

/// Client for the public food nutrient database API.
pub struct FoodSafetyApiClient {
    client: reqwest::Client,
    url: String,
    service_key: String,
    rows_per_page: u32,
    page: u32,
}

impl FoodSafetyApiClient {
    pub fn from_config(config: &NutritionApiConfig) -> MealwiseResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: config.url(),
            service_key: config.service_key.clone(),
            rows_per_page: config.rows_per_page,
            page: config.page,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl NutritionSource for FoodSafetyApiClient {
    async fn lookup(&self, food_name: &str) -> MealwiseResult<Value> {
        let rows = self.rows_per_page.to_string();
        let page = self.page.to_string();
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("serviceKey", self.service_key.as_str()),
                ("type", "json"),
                ("FOOD_NM", food_name),
                ("numOfRows", rows.as_str()),
                ("pageNo", page.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LookupError::Status {
                source_name: SOURCE_NAME.to_string(),
                status: status.as_u16(),
                message,
            }
            .into());
        }

        response.json().await.map_err(|e| {
            LookupError::Decode {
                reason: format!("Failed to parse response: {}", e),
            }
            .into()
        })
    }

    fn source_name(&self) -> &str {
        SOURCE_NAME
    }
}

impl std::fmt::Debug for FoodSafetyApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FoodSafetyApiClient")
            .field("url", &self.url)
            .field("service_key", &"[REDACTED]")
            .finish()
    }
}

fn transport(message: String) -> mealwise_core::MealwiseError {
    LookupError::Transport {
        source_name: SOURCE_NAME.to_string(),
        message,
    }
    .into()
}

// ============================================================================
// STATIC SOURCE FOR TESTING
// ============================================================================

/// In-memory source with canned responses and a call counter.
///
/// Unknown names answer with an empty item list. A failing source answers
/// every lookup with a transport error.
#[derive(Debug, Default)]
pub struct StaticNutritionSource {
    responses: HashMap<String, Value>,
    failing: bool,
    calls: AtomicUsize,
}

impl StaticNutritionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_response(mut self, food_name: impl Into<String>, body: Value) -> Self {
        self.responses.insert(food_name.into(), body);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl NutritionSource for StaticNutritionSource {
    async fn lookup(&self, food_name: &str) -> MealwiseResult<Value> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.failing {
            return Err(LookupError::Transport {
                source_name: "static".to_string(),
                message: "connection refused".to_string(),
            }
            .into());
        }
        Ok(self
            .responses
            .get(food_name)
            .cloned()
            .unwrap_or_else(|| serde_json::json!({"body": {"items": []}})))
    }

    fn source_name(&self) -> &str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_url_from_config() {
        let client = FoodSafetyApiClient::from_config(&NutritionApiConfig::default()).unwrap();
        assert!(client.url().ends_with("/getFoodNtrCpntDbInq02"));
        assert_eq!(client.source_name(), SOURCE_NAME);
    }

    #[tokio::test]
    async fn test_static_source_counts_calls() {
        let source = StaticNutritionSource::new().with_response("kimchi", json!({"ok": 1}));
        assert_eq!(source.lookup("kimchi").await.unwrap(), json!({"ok": 1}));
        assert_eq!(
            source.lookup("tofu").await.unwrap(),
            json!({"body": {"items": []}})
        );
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_source() {
        let source = StaticNutritionSource::failing();
        assert!(source.lookup("kimchi").await.is_err());
    }
}
