/// Groq completion API client
/// All language-model traffic goes through here; every call is logged with
/// token usage, estimated cost, and latency.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::middleware::error_handling::{AppError, Result};

/// Model for SQL generation and summarization.
pub const SQL_MODEL: &str = "llama3-70b-8192";
/// Smaller model for candidate question generation.
pub const QUESTION_MODEL: &str = "llama3-8b-8192";

// Pricing per million tokens, used only for log-line cost estimates
const INPUT_COST_PER_MILLION: f64 = 0.59;
const OUTPUT_COST_PER_MILLION: f64 = 0.79;

// ============================================================================
// Request/Response Models
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<GroqMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GroqMessage {
    pub role: String, // "user" or "assistant"
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize, Clone)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

// ============================================================================
// Public API Models
// ============================================================================

#[derive(Debug)]
pub struct GroqApiResponse {
    pub content: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub cost_usd: f64,
    pub latency_ms: u64,
}

/// Configuration for a single completion request
pub struct GroqRequestConfig {
    pub model: &'static str,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    /// When true the API is asked for a JSON object reply
    /// (`response_format: {"type": "json_object"}`).
    pub json_mode: bool,
}

impl Default for GroqRequestConfig {
    fn default() -> Self {
        Self {
            model: SQL_MODEL,
            max_tokens: 1024,
            temperature: None,
            json_mode: false,
        }
    }
}

// ============================================================================
// Groq Service
// ============================================================================

pub struct GroqService {
    api_key: String,
    api_url: String,
    http_client: reqwest::Client,
}

impl GroqService {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            api_key,
            api_url,
            http_client: reqwest::Client::new(),
        }
    }

    /// Send a chat-completion request and return the first choice's content.
    pub async fn send_message(
        &self,
        messages: Vec<GroqMessage>,
        config: GroqRequestConfig,
    ) -> Result<GroqApiResponse> {
        let start_time = Instant::now();

        let request = ChatCompletionRequest {
            model: config.model.to_string(),
            messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            response_format: config.json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("completion API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!("Completion API error ({}): {}", status, error_body);
            return Err(AppError::Upstream(format!(
                "completion API returned {}",
                status
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::Upstream(format!("failed to parse completion response: {}", e))
        })?;

        let latency_ms = start_time.elapsed().as_millis() as u64;

        let usage = completion.usage.clone();
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::Upstream("completion response had no choices".to_string()))?;

        let input_cost = (usage.prompt_tokens as f64 / 1_000_000.0) * INPUT_COST_PER_MILLION;
        let output_cost = (usage.completion_tokens as f64 / 1_000_000.0) * OUTPUT_COST_PER_MILLION;
        let total_cost = input_cost + output_cost;

        tracing::info!(
            "Completion API call: model={}, tokens_in={}, tokens_out={}, cost=${:.6}, latency={}ms",
            config.model,
            usage.prompt_tokens,
            usage.completion_tokens,
            total_cost,
            latency_ms
        );

        Ok(GroqApiResponse {
            content,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            cost_usd: total_cost,
            latency_ms,
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

pub fn user_message(content: impl Into<String>) -> GroqMessage {
    GroqMessage {
        role: "user".to_string(),
        content: content.into(),
    }
}

pub fn assistant_message(content: impl Into<String>) -> GroqMessage {
    GroqMessage {
        role: "assistant".to_string(),
        content: content.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_mode_sets_response_format() {
        let request = ChatCompletionRequest {
            model: SQL_MODEL.to_string(),
            messages: vec![user_message("hi")],
            max_tokens: 256,
            temperature: Some(0.3),
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["model"], SQL_MODEL);
    }

    #[test]
    fn plain_mode_omits_response_format_and_temperature() {
        let request = ChatCompletionRequest {
            model: QUESTION_MODEL.to_string(),
            messages: vec![user_message("hi")],
            max_tokens: 256,
            temperature: None,
            response_format: None,
        };

        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("response_format").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn completion_response_parses_usage_and_content() {
        let raw = r#"{
            "id": "chatcmpl-123",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "hello"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 4, "total_tokens": 14}
        }"#;

        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hello");
        assert_eq!(parsed.usage.prompt_tokens, 10);
        assert_eq!(parsed.usage.completion_tokens, 4);
    }
}
