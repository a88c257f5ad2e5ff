//! Vanilla RAG Baseline
//!
//! One retrieval, one oracle call. Used as the comparison point for the agent loop.

use std::path::Path;

use agent_core::{LlmProvider, Message, provider::GenerationOptions};
use anyhow::Context;
use rag_tools::{Passage, Retriever, render_context};
use serde::{Deserialize, Serialize};

/// Single-shot answering prompt
pub fn render_prompt(query: &str, context: &str) -> String {
    format!(
        r#"You are an expert Multi-Hop question answering AI assistant with access to a vast corpus of external knowledge.

CONTEXT:
{context}

QUESTION:
{query}

Please provide a succinct, to the point answer to the question based on the given context. The answer is always a "yes", "no", "before", "after" or an entity's name.
If you can't find the answer in the context, or if you don't know, respond saying "I dont know".
Remember, don't blindly repeat the contexts verbatim and don't tell the user how you used the citations or context- just respond with the answer.
It is very important for my career that you follow these instructions. Also don't mention the context in your response."#
    )
}

/// Everything the baseline needs to answer
pub struct Baseline<'a> {
    pub provider: &'a dyn LlmProvider,
    pub generation: &'a GenerationOptions,
    pub retriever: &'a dyn Retriever,
    pub top_k: usize,
}

/// Answer plus the passages it was generated from
#[derive(Debug)]
pub struct BaselineAnswer {
    pub generated_answer: String,
    pub passages: Vec<Passage>,
}

/// One record of a MultiHop-RAG style query file
#[derive(Debug, Deserialize)]
pub struct DatasetRecord {
    pub query: String,
    pub answer: String,
    #[serde(default)]
    pub question_type: String,
    #[serde(default)]
    pub evidence_list: serde_json::Value,
}

/// One line of the results file
#[derive(Debug, Serialize)]
pub struct BaselineRecord {
    pub query: String,
    pub answer: String,
    pub generated_answer: String,
    pub question_type: String,
    pub retrieval_list: Vec<Passage>,
    pub gold_list: serde_json::Value,
}

impl Baseline<'_> {
    pub async fn answer(&self, query: &str) -> anyhow::Result<BaselineAnswer> {
        let passages = self.retriever.retrieve(query, self.top_k).await?;
        let prompt = render_prompt(query, &render_context(&passages));

        let completion = self
            .provider
            .complete(&[Message::user(prompt)], self.generation)
            .await?;

        Ok(BaselineAnswer {
            generated_answer: completion.content,
            passages,
        })
    }

    /// Answer the first `limit` dataset records and write the results as JSON
    pub async fn run_dataset(
        &self,
        dataset: &Path,
        limit: usize,
        output: &Path,
    ) -> anyhow::Result<Vec<BaselineRecord>> {
        let raw = std::fs::read_to_string(dataset)
            .with_context(|| format!("failed to read dataset {}", dataset.display()))?;
        let records: Vec<DatasetRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid dataset {}", dataset.display()))?;

        let total = records.len().min(limit);
        let mut results = Vec::with_capacity(total);

        for (i, record) in records.into_iter().take(limit).enumerate() {
            tracing::info!(record = i + 1, total, "Baseline query");
            let answer = self
                .answer(&record.query)
                .await
                .with_context(|| format!("record {} failed: {}", i + 1, record.query))?;

            results.push(BaselineRecord {
                query: record.query,
                answer: record.answer,
                generated_answer: answer.generated_answer,
                question_type: record.question_type,
                retrieval_list: answer.passages,
                gold_list: record.evidence_list,
            });
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(output, serde_json::to_string(&results)?)
            .with_context(|| format!("failed to write {}", output.display()))?;

        tracing::info!(records = results.len(), path = %output.display(), "Baseline results saved");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{
        Result,
        provider::{Completion, ModelInfo, ProviderInfo},
    };
    use async_trait::async_trait;
    use rag_tools::{Document, KeywordRetriever, Metadata};
    use std::sync::Mutex;

    #[derive(Default)]
    struct EchoProvider {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn info(&self) -> Result<ProviderInfo> {
            Ok(ProviderInfo {
                name: "echo".into(),
                models: Vec::new(),
            })
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            messages: &[Message],
            options: &GenerationOptions,
        ) -> Result<Completion> {
            self.prompts.lock().unwrap().push(messages[0].content.clone());
            Ok(Completion::text("European Commission", &options.model))
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }
    }

    async fn retriever() -> KeywordRetriever {
        let mut metadata = Metadata::default();
        metadata.insert("title", "EU inquiry");
        KeywordRetriever::in_memory(vec![Document {
            text: "The European Commission is reviewing Amazon's iRobot deal.".into(),
            metadata,
        }])
        .await
        .unwrap()
    }

    #[test]
    fn test_prompt_places_context_and_query() {
        let prompt = render_prompt("Who?", "Title: X\nbody");
        assert!(prompt.contains("CONTEXT:\nTitle: X\nbody\n\nQUESTION:\nWho?"));
        assert!(prompt.contains("I dont know"));
    }

    #[tokio::test]
    async fn test_answer_uses_retrieved_context() {
        let provider = EchoProvider::default();
        let index = retriever().await;
        let generation = GenerationOptions::default();
        let baseline = Baseline {
            provider: &provider,
            generation: &generation,
            retriever: &index,
            top_k: 3,
        };

        let answer = baseline.answer("Who reviews the iRobot deal?").await.unwrap();

        assert_eq!(answer.generated_answer, "European Commission");
        assert_eq!(answer.passages.len(), 1);
        let prompts = provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("Title: EU inquiry\nThe European Commission"));
    }

    #[tokio::test]
    async fn test_dataset_run_writes_results() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("MultiHopRAG.json");
        std::fs::write(
            &dataset,
            r#"[
                {"query": "Who reviews the iRobot deal?", "answer": "European Commission",
                 "question_type": "inference_query", "evidence_list": [{"title": "EU inquiry"}]},
                {"query": "Is Amazon buying iRobot?", "answer": "yes",
                 "question_type": "comparison_query", "evidence_list": []}
            ]"#,
        )
        .unwrap();
        let output = dir.path().join("output").join("vanilla_rag.json");

        let provider = EchoProvider::default();
        let index = retriever().await;
        let generation = GenerationOptions::default();
        let baseline = Baseline {
            provider: &provider,
            generation: &generation,
            retriever: &index,
            top_k: 3,
        };

        let results = baseline.run_dataset(&dataset, 1, &output).await.unwrap();
        assert_eq!(results.len(), 1);

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        let first = &saved[0];
        assert_eq!(first["answer"], "European Commission");
        assert_eq!(first["generated_answer"], "European Commission");
        assert_eq!(first["question_type"], "inference_query");
        assert_eq!(first["gold_list"][0]["title"], "EU inquiry");
        assert_eq!(first["retrieval_list"][0]["metadata"]["title"], "EU inquiry");
        assert_eq!(saved.as_array().unwrap().len(), 1);
    }
}
