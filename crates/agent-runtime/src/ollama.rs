//! Ollama LLM Provider
//!
//! Implementation of `LlmProvider` for local Ollama inference over its REST API.

use agent_core::{
    error::{AgentError, Result},
    message::Message,
    provider::{
        Completion, FinishReason, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo,
        TokenUsage,
    },
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "llama3";

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            timeout_secs: 60,
        }
    }
}

impl OllamaConfig {
    pub fn from_env() -> Self {
        let host = std::env::var("OLLAMA_HOST")
            .unwrap_or_else(|_| "http://localhost".into());
        let port = std::env::var("OLLAMA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(11434);

        Self {
            host,
            port,
            ..Default::default()
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}:{}", self.host.trim_end_matches('/'), self.port)
    }
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create a new Ollama provider with custom host/port
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        Self::from_config(OllamaConfig {
            host: host.into(),
            port,
            ..Default::default()
        })
    }

    /// Create from configuration
    pub fn from_config(config: OllamaConfig) -> Result<Self> {
        let client = crate::http::client(config.timeout_secs)?;
        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OllamaConfig::from_env())
    }

    /// Convert agent messages to Ollama format
    fn convert_messages(messages: &[Message]) -> Vec<OllamaMessage> {
        messages
            .iter()
            .map(|m| OllamaMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Build Ollama generation options
    fn build_options(opts: &GenerationOptions) -> OllamaOptions {
        OllamaOptions {
            temperature: opts.temperature,
            top_p: opts.top_p,
            num_predict: opts.max_tokens,
            stop: opts.stop_sequences.clone(),
        }
    }

    /// Convert Ollama response to agent completion
    fn convert_completion(response: OllamaChatResponse, model: &str) -> Completion {
        let usage = match (response.prompt_eval_count, response.eval_count) {
            (None, None) => None,
            (prompt, eval) => {
                let prompt_tokens = prompt.unwrap_or(0);
                let completion_tokens = eval.unwrap_or(0);
                Some(TokenUsage {
                    prompt_tokens,
                    completion_tokens,
                    total_tokens: prompt_tokens.saturating_add(completion_tokens),
                })
            }
        };

        Completion {
            content: response.message.content,
            model: response.model.unwrap_or_else(|| model.to_string()),
            usage,
            finish_reason: Some(
                response
                    .done_reason
                    .as_deref()
                    .map_or(FinishReason::Stop, FinishReason::from_wire),
            ),
        }
    }

    fn transport_error(&self, e: &reqwest::Error) -> AgentError {
        if e.is_connect() || e.is_timeout() {
            AgentError::ProviderUnavailable(format!(
                "Cannot reach Ollama at {}: {e}",
                self.config.base_url()
            ))
        } else {
            AgentError::Provider(e.to_string())
        }
    }

    async fn fetch_tags(&self) -> Result<OllamaTags> {
        let url = format!("{}/api/tags", self.config.base_url());
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if !response.status().is_success() {
            return Err(AgentError::ProviderUnavailable(format!(
                "Ollama API error ({})",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("Failed to parse Ollama model list: {e}")))
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        let models = self.list_models().await.unwrap_or_default();

        Ok(ProviderInfo {
            name: "Ollama".into(),
            models,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self.fetch_tags().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = OllamaChatRequest {
            model: options.model.clone(),
            messages: Self::convert_messages(messages),
            stream: false,
            options: Self::build_options(options),
        };

        tracing::debug!(model = %options.model, messages = messages.len(), "Ollama request");

        let url = format!("{}/api/chat", self.config.base_url());
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider(format!("Ollama API error ({status}): {body}")));
        }

        let chat: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("Failed to parse Ollama response: {e}")))?;

        Ok(Self::convert_completion(chat, &options.model))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let tags = self.fetch_tags().await?;

        Ok(tags
            .models
            .into_iter()
            .map(|m| ModelInfo {
                id: m.name.clone(),
                name: m.name,
                context_length: None, // Not exposed by /api/tags
            })
            .collect())
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    model: Option<String>,
    message: OllamaMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    name: String,
}
