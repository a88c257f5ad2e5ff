//! Command Handlers

use std::path::Path;
use std::sync::Arc;

use agent_core::{AgentBuilder, Finish, RunOutcome};
use rag_tools::{
    HumanInput, Retriever, StdinHuman,
    tools::{AskHuman, Retrieve},
};

use crate::baseline::Baseline;
use crate::console::Transcript;
use crate::setup::Oracle;

/// Limits for one agent run
pub struct AskOptions {
    pub max_steps: usize,
    pub retry_limit: usize,
    pub history_limit: usize,
    pub top_k: usize,
    pub human_suffix: Option<String>,
}

/// Run the agent loop on one question, prompting for it when absent
pub async fn handle_ask(
    oracle: Oracle,
    retriever: Arc<dyn Retriever>,
    query: Option<String>,
    options: AskOptions,
) -> anyhow::Result<RunOutcome> {
    let human = Arc::new(StdinHuman::new());

    let query = match query {
        Some(query) => query,
        None => human.prompt("Please enter your query: ").await?,
    };
    if query.trim().is_empty() {
        anyhow::bail!("no query given");
    }

    let mut ask_human = AskHuman::new(human);
    if let Some(suffix) = options.human_suffix {
        ask_human = ask_human.with_suffix(suffix);
    }

    let mut agent = AgentBuilder::new()
        .provider(oracle.provider)
        .generation(oracle.generation)
        .capability(Retrieve::with_top_k(retriever, options.top_k))
        .capability(Finish)
        .capability(ask_human)
        .max_steps(options.max_steps)
        .retry_limit(options.retry_limit)
        .history_limit(options.history_limit)
        .observer(Arc::new(Transcript::stdout()))
        .build()?;

    tracing::info!("Registered {} capabilities:", agent.capabilities().len());
    for name in agent.capabilities().names() {
        tracing::info!("  • {}", name);
    }

    let outcome = agent.run(&query).await?;
    tracing::info!(
        termination = %outcome.termination,
        iterations = outcome.iterations_used,
        "Agent finished"
    );
    Ok(outcome)
}

/// Answer a single question with the baseline and print it
pub async fn handle_baseline_query(baseline: &Baseline<'_>, query: &str) -> anyhow::Result<()> {
    let answer = baseline.answer(query).await?;

    for passage in &answer.passages {
        tracing::debug!(score = passage.score, title = ?passage.metadata.get("title"), "Context passage");
    }
    println!("ANSWER: {}", answer.generated_answer.trim());
    Ok(())
}

/// Evaluate the baseline over a dataset file
pub async fn handle_baseline_dataset(
    baseline: &Baseline<'_>,
    dataset: &Path,
    limit: usize,
    output: &Path,
) -> anyhow::Result<()> {
    let results = baseline.run_dataset(dataset, limit, output).await?;
    println!("Wrote {} results to {}", results.len(), output.display());
    Ok(())
}
