//! Retrieve Capability
//!
//! Looks up passages for the model's query and returns them as one context block.

use std::sync::Arc;

use agent_core::{Capability, Result as CoreResult};
use async_trait::async_trait;

use crate::retriever::{Retriever, render_context};

/// Default number of passages per lookup
pub const DEFAULT_TOP_K: usize = 3;

const USAGE: &str = "Retrieves relevant context from the documents. Input should be a search query \
capturing the essence of the content to find, without sources or dates. Query only ONE source \
per call, do not retrieve multiple articles at once.";

/// Capability that queries a retrieval backend
pub struct Retrieve {
    retriever: Arc<dyn Retriever>,
    top_k: usize,
}

impl Retrieve {
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self::with_top_k(retriever, DEFAULT_TOP_K)
    }

    pub fn with_top_k(retriever: Arc<dyn Retriever>, top_k: usize) -> Self {
        Self {
            retriever,
            top_k: top_k.max(1),
        }
    }

    pub const fn top_k(&self) -> usize {
        self.top_k
    }
}

#[async_trait]
impl Capability for Retrieve {
    fn name(&self) -> &str {
        "retrieve"
    }

    fn usage(&self) -> &str {
        USAGE
    }

    async fn execute(&self, input: &str) -> CoreResult<String> {
        let mut passages = self.retriever.retrieve(input, self.top_k).await?;
        passages.truncate(self.top_k);

        tracing::info!(
            backend = self.retriever.name(),
            passages = passages.len(),
            "Retrieved context"
        );

        Ok(render_context(&passages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Document;
    use crate::error::Result;
    use crate::retriever::{KeywordRetriever, Metadata, Passage};
    use agent_core::AgentError;

    struct FloodRetriever;

    #[async_trait]
    impl Retriever for FloodRetriever {
        async fn retrieve(&self, _query: &str, _top_k: usize) -> Result<Vec<Passage>> {
            Ok((0..5)
                .map(|i| Passage {
                    text: format!("passage {i}"),
                    metadata: Metadata::default(),
                    score: 1.0,
                })
                .collect())
        }

        fn len(&self) -> usize {
            5
        }

        fn name(&self) -> &str {
            "flood"
        }
    }

    async fn corpus() -> Arc<dyn Retriever> {
        let mut metadata = Metadata::default();
        metadata.insert("title", "AI Office staffing");
        metadata.insert("source", "TechCrunch");
        let index = KeywordRetriever::in_memory(vec![Document {
            text: "The Commission is deploying staff\n\nwithin its AI Office.".into(),
            metadata,
        }])
        .await
        .unwrap();
        Arc::new(index)
    }

    #[tokio::test]
    async fn test_returns_rendered_context() {
        let output = Retrieve::new(corpus().await).execute("AI Office staff").await.unwrap();

        assert_eq!(
            output,
            "Title: AI Office staffing\nSource: TechCrunch\n\
             The Commission is deploying staff\nwithin its AI Office."
        );
    }

    #[tokio::test]
    async fn test_caps_passages_at_top_k() {
        let output = Retrieve::with_top_k(Arc::new(FloodRetriever), 2)
            .execute("anything")
            .await
            .unwrap();

        assert_eq!(output, "passage 0\n\npassage 1");
    }

    #[tokio::test]
    async fn test_backend_error_becomes_capability_error() {
        let err = Retrieve::new(corpus().await).execute("?!").await.unwrap_err();
        assert!(matches!(err, AgentError::CapabilityExecution(_)));
    }

    #[tokio::test]
    async fn test_descriptor() {
        let retrieve = Retrieve::new(corpus().await);
        assert_eq!(retrieve.name(), "retrieve");
        assert_eq!(retrieve.top_k(), DEFAULT_TOP_K);
        assert!(retrieve.usage().contains("ONE source"));
    }
}
