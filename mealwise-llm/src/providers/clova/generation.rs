//! CLOVA Studio generation provider implementation

use super::types::{ChatRequest, ChatResponse};
use crate::providers::{http_client, invalid_response, request_failed};
use crate::GenerationProvider;
use async_trait::async_trait;
use mealwise_core::{GenerationConfig, GenerationRequest, MealwiseResult};
use reqwest::Client;

const PROVIDER: &str = "clova";

/// Generation provider for the CLOVA Studio chat-completions API.
pub struct ClovaGenerationProvider {
    client: Client,
    url: String,
    api_key: String,
    apigw_key: String,
    request_id: String,
}

impl ClovaGenerationProvider {
    pub fn from_config(config: &GenerationConfig) -> MealwiseResult<Self> {
        Ok(Self {
            client: http_client(PROVIDER, config.timeout())?,
            url: format!(
                "{}/testapp/v1/chat-completions/{}",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key: config.api_key.clone(),
            apigw_key: config.apigw_key.clone(),
            request_id: config.request_id.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl GenerationProvider for ClovaGenerationProvider {
    async fn complete(&self, request: &GenerationRequest) -> MealwiseResult<String> {
        let body = ChatRequest::from(request);

        let mut builder = self
            .client
            .post(&self.url)
            .header("X-NCP-CLOVASTUDIO-API-KEY", &self.api_key)
            .header("X-NCP-APIGW-API-KEY", &self.apigw_key)
            .json(&body);
        if !self.request_id.is_empty() {
            builder = builder.header("X-NCP-CLOVASTUDIO-REQUEST-ID", &self.request_id);
        }

        let response = builder
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

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| invalid_response(PROVIDER, format!("Failed to parse response: {}", e)))?;

        match chat.result {
            Some(result) => {
                tracing::debug!(chars = result.message.content.len(), "Generation complete");
                Ok(result.message.content)
            }
            None => {
                let reason = chat
                    .status
                    .map(|s| format!("no result (status {}: {})", s.code, s.message))
                    .unwrap_or_else(|| "no result in response".to_string());
                Err(invalid_response(PROVIDER, reason))
            }
        }
    }

    fn provider_id(&self) -> &str {
        PROVIDER
    }
}

impl std::fmt::Debug for ClovaGenerationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClovaGenerationProvider")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("apigw_key", &"[REDACTED]")
            .finish()
    }
}
