//! OpenAI-compatible chat-completions adapter.
//!
//! Works against api.openai.com and any endpoint speaking the same wire
//! format (Azure OpenAI deployments, vLLM, Together, local gateways). One
//! adapter instance owns one base URL and one API key.

use async_trait::async_trait;
use orchestrator_core::{AiProvider, CallParams, OrchestratorError, ProviderResponse};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for an OpenAI-compatible adapter instance
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Registered provider name this adapter serves
    pub name: String,
    /// API key for this instance
    pub api_key: SecretString,
    /// Base URL, without the `/chat/completions` suffix
    pub base_url: String,
    /// Model to request
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Create a configuration for the hosted OpenAI API
    #[must_use]
    pub fn new(name: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_key: SecretString::new(api_key.into()),
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Point the adapter at a compatible non-OpenAI endpoint
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u32,
}

/// Adapter for OpenAI-compatible chat-completions endpoints
pub struct OpenAiCompatibleProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiCompatibleProvider {
    /// Create a new adapter.
    ///
    /// # Errors
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, OrchestratorError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OrchestratorError::config(format!("HTTP client build failed: {e}")))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl AiProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn call(
        &self,
        prompt: &str,
        params: &CallParams,
    ) -> Result<ProviderResponse, OrchestratorError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        debug!(provider = %self.config.name, model = %self.config.model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OrchestratorError::timeout(&self.config.name, self.config.timeout)
                } else {
                    OrchestratorError::provider(&self.config.name, format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(
                provider = %self.config.name,
                status = %status,
                "Upstream returned error status"
            );
            return Err(OrchestratorError::provider(
                &self.config.name,
                format!("HTTP {status}: {detail}"),
            ));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            OrchestratorError::provider(&self.config.name, format!("malformed response: {e}"))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                OrchestratorError::provider(&self.config.name, "response contained no choices")
            })?;

        let mut result = ProviderResponse::success(&self.config.name, content, parsed.model);
        if let Some(usage) = parsed.usage {
            result = result.with_tokens_used(usage.total_tokens);
        }
        Ok(result)
    }
}
