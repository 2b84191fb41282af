//! OpenAI-compatible chat completion client.
//!
//! One client instance is bound to one platform endpoint (base URL, API key,
//! model). The request shape is the common `/chat/completions` dialect; an
//! optional JSON extension object is flattened into the request body for
//! platforms that need vendor parameters.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::LlmError;

/// A message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (e.g., "system", "user", "assistant").
    pub role: String,
    /// Content of the message.
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Trait for chat backends, mockable in tests.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a conversation and return the assistant's reply text.
    async fn chat(&self, messages: Vec<Message>) -> Result<String, LlmError>;
}

/// Client for one OpenAI-compatible platform endpoint.
pub struct ChatClient {
    /// Base URL of the API, without the `/chat/completions` suffix.
    base_url: String,
    api_key: String,
    /// Model identifier sent with every request.
    model: String,
    /// Sampling temperature.
    temperature: f64,
    /// Completion token budget. Generous enough that keyword JSON is rarely
    /// truncated mid-array.
    max_tokens: u32,
    /// Vendor-specific request fields flattened into the body.
    extra_body: Option<serde_json::Value>,
    http_client: Client,
}

impl ChatClient {
    /// Create a client for one platform endpoint.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.3,
            max_tokens: 1200,
            extra_body: None,
            http_client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Attach vendor-specific request fields (e.g. Hunyuan's
    /// `{"enable_enhancement": true}`).
    pub fn with_extra_body(mut self, extra_body: serde_json::Value) -> Self {
        self.extra_body = Some(extra_body);
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion token budget.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The model this client requests.
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Internal request structure for the OpenAI-compatible API.
#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
    max_tokens: u32,
    // A flattened None emits no fields at all.
    #[serde(flatten)]
    extra: Option<serde_json::Value>,
}

/// Internal response structure from the OpenAI-compatible API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    content: String,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[async_trait]
impl ChatProvider for ChatClient {
    async fn chat(&self, messages: Vec<Message>) -> Result<String, LlmError> {
        let api_request = ApiRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            extra: self.extra_body.clone(),
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let http_response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&api_request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();

        if !status.is_success() {
            let status_code = status.as_u16();

            let error_text = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            // Prefer the structured message when the body parses
            let message = match serde_json::from_str::<ApiErrorResponse>(&error_text) {
                Ok(error_response) => error_response.error.message,
                Err(_) => error_text,
            };

            if status_code == 429 {
                return Err(LlmError::RateLimited(message));
            }

            return Err(LlmError::ApiError {
                code: status_code,
                message,
            });
        }

        let api_response: ApiResponse = http_response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(content)
    }
}
