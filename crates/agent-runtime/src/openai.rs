//! OpenAI-compatible Provider
//!
//! Chat-completions client for hosted backends that speak the OpenAI wire format.
//! Groq and OpenAI both do; they differ only in base URL, key and default model.

use agent_core::{
    error::{AgentError, Result},
    message::Message,
    provider::{
        Completion, FinishReason, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo,
        TokenUsage,
    },
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const GROQ_DEFAULT_MODEL: &str = "llama3-70b-8192";

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4";

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Clone)]
pub struct OpenAiConfig {
    /// Display name ("Groq", "OpenAI")
    pub name: String,

    /// API root, without trailing `/chat/completions`
    pub base_url: String,

    /// Bearer token
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl OpenAiConfig {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout_secs: 120,
        }
    }

    /// Groq settings from `GROQ_API_KEY`
    pub fn groq_from_env() -> Result<Self> {
        Self::from_env("Groq", "GROQ_API_KEY", GROQ_BASE_URL.to_string())
    }

    /// OpenAI settings from `OPENAI_API_KEY` (and optional `OPENAI_BASE_URL`)
    pub fn openai_from_env() -> Result<Self> {
        let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| OPENAI_BASE_URL.into());
        Self::from_env("OpenAI", "OPENAI_API_KEY", base_url)
    }

    fn from_env(name: &str, key_var: &str, base_url: String) -> Result<Self> {
        let api_key = std::env::var(key_var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AgentError::Config(format!(
                    "{key_var} environment variable not set. Please set it to your {name} API key."
                ))
            })?;

        Ok(Self::new(name, base_url, api_key))
    }
}

/// Provider for OpenAI-compatible chat completion APIs
pub struct OpenAiProvider {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    pub fn from_config(config: OpenAiConfig) -> Result<Self> {
        let client = crate::http::client(config.timeout_secs)?;
        Ok(Self { client, config })
    }

    /// Groq provider; fails when `GROQ_API_KEY` is missing
    pub fn groq_from_env() -> Result<Self> {
        OpenAiConfig::groq_from_env().and_then(Self::from_config)
    }

    /// OpenAI provider; fails when `OPENAI_API_KEY` is missing
    pub fn openai_from_env() -> Result<Self> {
        OpenAiConfig::openai_from_env().and_then(Self::from_config)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn status_error(&self, status: StatusCode, body: String) -> AgentError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(body),
            StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(body),
            s if s.is_server_error() => AgentError::ProviderUnavailable(format!(
                "{} API error ({s}): {body}",
                self.config.name
            )),
            s => AgentError::Provider(format!("{} API error ({s}): {body}", self.config.name)),
        }
    }

    fn transport_error(&self, e: &reqwest::Error) -> AgentError {
        if e.is_connect() || e.is_timeout() {
            AgentError::ProviderUnavailable(format!("Cannot reach {}: {e}", self.config.name))
        } else {
            AgentError::Provider(e.to_string())
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        let models = self.list_models().await.unwrap_or_default();

        Ok(ProviderInfo {
            name: self.config.name.clone(),
            models,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self.list_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("{} health check failed: {}", self.config.name, e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = ChatRequest {
            model: &options.model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            stop: (!options.stop_sequences.is_empty()).then_some(options.stop_sequences.as_slice()),
        };

        tracing::debug!(provider = %self.config.name, model = %options.model, "Chat completion request");

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.status_error(status, body));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("Failed to parse {} response: {e}", self.config.name)))?;

        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Provider(format!("{} returned no choices", self.config.name)))?;

        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            model: chat.model.unwrap_or_else(|| options.model.clone()),
            usage: chat.usage,
            finish_reason: choice.finish_reason.as_deref().map(FinishReason::from_wire),
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let response = self
            .client
            .get(self.endpoint("models"))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.status_error(status, body));
        }

        let list: ModelList = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("Failed to parse model list: {e}")))?;

        Ok(list
            .data
            .into_iter()
            .map(|m| ModelInfo {
                name: m.id.clone(),
                id: m.id,
                context_length: m.context_window,
            })
            .collect())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
    #[serde(default)]
    context_window: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method, path},
    };

    fn provider_for(server: &MockServer) -> OpenAiProvider {
        OpenAiProvider::from_config(OpenAiConfig::new("Groq", server.uri(), "test-key")).unwrap()
    }

    fn options() -> GenerationOptions {
        GenerationOptions {
            model: GROQ_DEFAULT_MODEL.into(),
            ..GenerationOptions::default()
        }
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = OpenAiConfig::from_env("Test", "REACT_AGENT_TEST_KEY_THAT_IS_NEVER_SET", GROQ_BASE_URL.into())
            .unwrap_err();
        assert!(matches!(err, AgentError::Config(msg) if msg.contains("REACT_AGENT_TEST_KEY_THAT_IS_NEVER_SET")));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = OpenAiConfig::new("OpenAI", OPENAI_BASE_URL, "sk-secret");
        assert!(!format!("{config:?}").contains("sk-secret"));
    }

    #[tokio::test]
    async fn test_complete_sends_bearer_and_parses_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": GROQ_DEFAULT_MODEL,
                "messages": [{"role": "system", "content": "rules"}, {"role": "user", "content": "q"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": GROQ_DEFAULT_MODEL,
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "{\"action\": \"finish\", \"input\": \"yes\"}"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 50, "completion_tokens": 10, "total_tokens": 60}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let completion = provider_for(&server)
            .complete(&[Message::system("rules"), Message::user("q")], &options())
            .await
            .unwrap();

        assert_eq!(completion.content, "{\"action\": \"finish\", \"input\": \"yes\"}");
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
        assert_eq!(completion.usage.unwrap().total_tokens, 60);
    }

    #[tokio::test]
    async fn test_status_codes_map_to_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider.complete(&[Message::user("q")], &options()).await.unwrap_err();
        assert!(matches!(err, AgentError::RateLimited(_)));
        assert!(err.is_retryable());

        let err = provider.list_models().await.unwrap_err();
        assert!(matches!(err, AgentError::Auth(body) if body == "bad key"));
        assert!(!provider.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_choices_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .complete(&[Message::user("q")], &options())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Provider(msg) if msg.contains("no choices")));
    }

    #[tokio::test]
    async fn test_list_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": [{"id": "llama3-70b-8192", "context_window": 8192}, {"id": "gemma-7b-it"}]
            })))
            .mount(&server)
            .await;

        let models = provider_for(&server).list_models().await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].context_length, Some(8192));
        assert_eq!(models[1].context_length, None);
    }
}
