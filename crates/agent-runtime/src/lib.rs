//! # agent-runtime
//!
//! Reasoning-oracle providers for the ReAct agent.
//!
//! ## Providers
//!
//! - **Ollama**: local inference via the Ollama REST API
//! - **Groq** / **OpenAI**: hosted chat completions over the OpenAI wire format
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::OpenAiProvider;
//!
//! let provider = OpenAiProvider::groq_from_env()?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

#[cfg(any(feature = "ollama", feature = "openai"))]
mod http;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "ollama")]
pub use ollama::OllamaProvider;

#[cfg(feature = "openai")]
pub use openai::{OpenAiConfig, OpenAiProvider};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentBuilder, AgentError, LlmProvider, Message, Result, Role, RunOutcome, Termination,
};
