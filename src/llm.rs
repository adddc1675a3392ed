//! Language-model provider abstraction and implementations.
//!
//! Mirrors the embedding provider layout: a [`ChatModel`] trait with a
//! disabled fallback and an OpenAI chat-completions implementation.
//! Inference is a single timeout-bounded call with no automatic retry;
//! failures surface as [`ServiceError::InferenceProvider`].

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::error::ServiceError;

/// External language-model backend: prompt in, answer text out.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;
    /// Produce a completion for the assembled prompt.
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// A no-op chat model that always returns errors.
pub struct DisabledChat;

#[async_trait]
impl ChatModel for DisabledChat {
    fn model_name(&self) -> &str {
        "disabled"
    }
    async fn complete(&self, _prompt: &str) -> Result<String, ServiceError> {
        Err(ServiceError::InferenceProvider(
            "llm provider is disabled".to_string(),
        ))
    }
}

/// Chat model using the OpenAI `POST /v1/chat/completions` endpoint.
///
/// Runs with temperature 0 for deterministic answers. Requires the
/// `OPENAI_API_KEY` environment variable at construction.
pub struct OpenAiChat {
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiChat {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("llm.model required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::InferenceProvider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ServiceError::InferenceProvider(format!(
                "OpenAI API error {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ServiceError::InferenceProvider(e.to_string()))?;

        parse_completion_response(&json)
    }
}

/// Extract `choices[0].message.content` from a chat-completions response.
fn parse_completion_response(json: &serde_json::Value) -> Result<String, ServiceError> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            ServiceError::InferenceProvider("invalid response: missing completion".to_string())
        })
}

/// Instantiate the chat model named by the configuration.
pub fn create_model(config: &LlmConfig) -> Result<Box<dyn ChatModel>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledChat)),
        "openai" => Ok(Box::new(OpenAiChat::new(config)?)),
        other => bail!("Unknown llm provider: {}", other),
    }
}
