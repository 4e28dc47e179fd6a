//! Groq service for chat completions
//!
//! Groq serves an OpenAI-compatible REST API, so this is a thin reqwest
//! client over `POST {base_url}/chat/completions`.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

use crate::config::LlmConfig;
use crate::schemas::openai::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, OpenAIErrorResponse,
};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when calling the Groq API
#[derive(Error, Debug)]
pub enum GroqError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

// ============================================================================
// Chat Backend
// ============================================================================

/// Anything that can turn a conversation into the assistant's next turn
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Returns the content of the first choice, or `None` when the model
    /// answered without text
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<Option<String>, GroqError>;

    /// Model identifier, for greetings and logs
    fn model_id(&self) -> &str;
}

// ============================================================================
// Groq Service
// ============================================================================

/// Service for interacting with the Groq chat completions API
#[derive(Clone)]
pub struct GroqService {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GroqService {
    /// Create a new Groq service
    pub fn new(config: &LlmConfig) -> Result<Self, GroqError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        tracing::info!(
            model = %config.model_id,
            base_url = %config.base_url,
            "Initialized Groq service"
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model_id.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn build_request(&self, messages: Vec<ChatMessage>) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        }
    }
}

#[async_trait]
impl ChatBackend for GroqService {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<Option<String>, GroqError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = self.build_request(messages);

        tracing::debug!(
            model = %self.model,
            url = %url,
            message_count = request.messages.len(),
            "Calling Groq chat completions API"
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<OpenAIErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(GroqError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, body = %body, "Failed to parse Groq response");
            GroqError::ParseError(e.to_string())
        })?;

        if let Some(usage) = &completion.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Groq completion finished"
            );
        }

        Ok(completion.first_content().map(str::to_string))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Tests
// ============================================================================
