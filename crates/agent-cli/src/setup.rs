//! Startup Wiring
//!
//! Provider selection and retrieval index construction shared by every command.

use std::path::Path;
use std::sync::Arc;

use agent_core::{LlmProvider, provider::GenerationOptions};
use agent_runtime::{
    OllamaProvider, OpenAiProvider, ollama,
    openai::{GROQ_DEFAULT_MODEL, OPENAI_DEFAULT_MODEL},
};
use anyhow::Context;
use rag_tools::{KeywordRetriever, Retriever, TextSplitter};

use crate::cli::{LlmArgs, ProviderKind};

/// Oracle plus the generation options to call it with
pub struct Oracle {
    pub provider: Arc<dyn LlmProvider>,
    pub generation: GenerationOptions,
}

impl ProviderKind {
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Ollama => ollama::DEFAULT_MODEL,
            Self::Groq => GROQ_DEFAULT_MODEL,
            Self::Openai => OPENAI_DEFAULT_MODEL,
        }
    }
}

/// Build generation options from the command line
pub fn generation_options(args: &LlmArgs) -> GenerationOptions {
    GenerationOptions {
        model: args
            .model
            .clone()
            .unwrap_or_else(|| args.provider.default_model().to_string()),
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        ..Default::default()
    }
}

/// Construct the selected provider and verify it answers
pub async fn connect(args: &LlmArgs) -> anyhow::Result<Oracle> {
    let provider: Arc<dyn LlmProvider> = match args.provider {
        ProviderKind::Ollama => Arc::new(
            OllamaProvider::from_env().context("Ollama backend could not be initialized")?,
        ),
        ProviderKind::Groq => Arc::new(
            OpenAiProvider::groq_from_env().context("Groq backend is not configured")?,
        ),
        ProviderKind::Openai => Arc::new(
            OpenAiProvider::openai_from_env().context("OpenAI backend is not configured")?,
        ),
    };
    let generation = generation_options(args);

    match provider.health_check().await {
        Ok(true) => {
            tracing::info!(provider = ?args.provider, model = %generation.model, "✓ Connected");
        }
        Ok(false) | Err(_) => {
            tracing::warn!(provider = ?args.provider, "⚠ Backend not reachable - requests will fail");
            if args.provider == ProviderKind::Ollama {
                tracing::warn!("  Make sure Ollama is running: ollama serve");
            }
        }
    }

    Ok(Oracle {
        provider,
        generation,
    })
}

/// Open the keyword index, building it from the corpus when needed
pub async fn open_index(index: &Path, corpus: &Path) -> anyhow::Result<Arc<dyn Retriever>> {
    let retriever = KeywordRetriever::open(index, corpus, &TextSplitter::default())
        .await
        .with_context(|| format!("failed to index corpus {}", corpus.display()))?;

    tracing::info!(
        chunks = retriever.len(),
        backend = retriever.name(),
        reused = retriever.reused(),
        "Retrieval index ready"
    );
    Ok(Arc::new(retriever))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(provider: ProviderKind, model: Option<&str>) -> LlmArgs {
        LlmArgs {
            provider,
            model: model.map(Into::into),
            temperature: 0.2,
            max_tokens: 512,
        }
    }

    #[test]
    fn test_default_model_per_backend() {
        assert_eq!(generation_options(&args(ProviderKind::Groq, None)).model, "llama3-70b-8192");
        assert_eq!(generation_options(&args(ProviderKind::Openai, None)).model, "gpt-4");
        assert_eq!(generation_options(&args(ProviderKind::Ollama, None)).model, "llama3");
    }

    #[test]
    fn test_explicit_model_and_sampling() {
        let options = generation_options(&args(ProviderKind::Ollama, Some("mistral")));
        assert_eq!(options.model, "mistral");
        assert!((options.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(options.max_tokens, 512);
    }

    #[tokio::test]
    async fn test_missing_corpus_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_index(&dir.path().join("index.db"), Path::new("/nonexistent/corpus.json"))
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("failed to index corpus"));
    }

    #[tokio::test]
    async fn test_index_opens_from_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus.json");
        std::fs::write(
            &corpus,
            r#"[{"title": "EU opens inquiry", "published_at": "2023-11-27", "source": "TechCrunch",
                 "body": "The European Commission is reviewing Amazon's iRobot deal."}]"#,
        )
        .unwrap();

        let retriever = open_index(&dir.path().join("index.db"), &corpus).await.unwrap();
        assert_eq!(retriever.len(), 1);
        assert_eq!(retriever.name(), "sqlite-fts5");
    }
}
