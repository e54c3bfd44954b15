//! CLOVA Studio API request and response types

use mealwise_core::GenerationRequest;
use serde::{Deserialize, Serialize};

// ============================================================================
// CHAT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub top_p: f32,
    pub top_k: i32,
    pub max_tokens: i32,
    pub temperature: f32,
    pub repeat_penalty: f32,
    pub stop_before: Vec<String>,
    pub include_ai_filters: bool,
}

impl From<&GenerationRequest> for ChatRequest {
    fn from(request: &GenerationRequest) -> Self {
        Self {
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: request.system.clone(),
                },
                Message {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
            top_p: request.sampling.top_p,
            top_k: request.sampling.top_k,
            max_tokens: request.sampling.max_tokens,
            temperature: request.sampling.temperature,
            repeat_penalty: request.sampling.repeat_penalty,
            stop_before: Vec::new(),
            include_ai_filters: request.include_ai_filters,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub result: Option<ChatResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResult {
    pub message: Message,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_wire_shape() {
        let request = GenerationRequest::new("be brief", "kimchi?");
        let body = serde_json::to_value(ChatRequest::from(&request)).unwrap();

        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "kimchi?");
        assert_eq!(body["topK"], 0);
        assert_eq!(body["maxTokens"], 1000);
        assert_eq!(body["stopBefore"], json!([]));
        assert_eq!(body["includeAiFilters"], true);
    }

    #[test]
    fn test_chat_response_content() {
        let response: ChatResponse = serde_json::from_value(json!({
            "status": {"code": "20000", "message": "OK"},
            "result": {"message": {"role": "assistant", "content": "eat more greens"}}
        }))
        .unwrap();
        assert_eq!(response.result.unwrap().message.content, "eat more greens");
    }
}
