//! OpenAI-compatible chat completions client.
//!
//! Works against any endpoint implementing `POST /chat/completions`; the
//! default is Groq.

use super::{LlmHttpConfig, LlmProvider, build_http_client};
use crate::config::LlmConfig;
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// OpenAI-compatible LLM client.
pub struct OpenAiClient {
    /// API key.
    api_key: Option<SecretString>,
    /// API endpoint.
    endpoint: String,
    /// Model to use.
    model: String,
    /// Sampling temperature.
    temperature: f32,
    /// Completion token limit.
    max_tokens: u32,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl OpenAiClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.groq.com/openai/v1";

    /// Default model.
    pub const DEFAULT_MODEL: &'static str = "mixtral-8x7b-32768";

    /// Creates a client with default settings and no API key.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_key: None,
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            client: build_http_client(LlmHttpConfig::default()),
        }
    }

    /// Creates a client from configuration.
    #[must_use]
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            endpoint: config.base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client: build_http_client(LlmHttpConfig::from_config(config).with_env_overrides()),
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Sets the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Validates that the client is configured.
    fn validate(&self) -> Result<()> {
        if self.api_key.is_none() {
            return Err(Error::SummarizationFailure(
                "API key not configured (set GROQ_API_KEY or PAPERLENS_LLM_API_KEY)".to_string(),
            ));
        }
        Ok(())
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    fn build_request(&self, messages: Vec<ChatMessage>) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// Makes a request to the chat completions API.
    fn request(&self, messages: Vec<ChatMessage>) -> Result<String> {
        self.validate()?;

        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| Error::SummarizationFailure("API key not configured".to_string()))?;

        let request = self.build_request(messages);

        tracing::debug!(model = %self.model, endpoint = %self.endpoint, "Sending chat completion");

        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", api_key.expose_secret()))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .map_err(|e| Error::SummarizationFailure(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::SummarizationFailure(format!(
                "API returned status: {status} - {body}"
            )));
        }

        let response: ChatCompletionResponse = response
            .json()
            .map_err(|e| Error::SummarizationFailure(format!("invalid response: {e}")))?;

        extract_content(response)
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai-compatible"
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        self.request(vec![ChatMessage::user(prompt)])
    }

    fn complete_with_system(&self, system: &str, user: &str) -> Result<String> {
        self.request(vec![ChatMessage::system(system), ChatMessage::user(user)])
    }
}

fn extract_content(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| Error::SummarizationFailure("No choices in response".to_string()))
}

/// Request to the Chat Completions API.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

/// A message in the chat.
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// Response from the Chat Completions API.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

/// A choice in the response.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
