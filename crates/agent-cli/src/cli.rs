//! CLI interface for react-agent

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// ReAct question-answering agent
///
/// Answers multi-hop questions over a news corpus by alternating reasoning with
/// retrieval, optionally asking a human for directions.
#[derive(Parser, Debug)]
#[command(name = "react-agent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub llm: LlmArgs,

    /// Article corpus (JSON array of {title, published_at, source, body})
    #[arg(long, global = true, value_name = "PATH", default_value = "data/corpus.json")]
    pub corpus: PathBuf,

    /// Keyword index database, built from the corpus on first use
    #[arg(long, global = true, value_name = "PATH", default_value = "data/index.db")]
    pub index: PathBuf,

    /// Debug log file
    #[arg(long, global = true, value_name = "PATH", default_value = "logs/app.log")]
    pub log_file: PathBuf,

    /// Log to stderr only
    #[arg(long, global = true)]
    pub no_log_file: bool,

    /// Passages returned per retrieval
    #[arg(long, global = true, default_value_t = 3)]
    pub top_k: usize,

    #[command(subcommand)]
    pub command: Command,
}

/// Reasoning oracle selection
#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    /// LLM backend
    #[arg(long, global = true, value_enum, default_value_t = ProviderKind::Groq)]
    pub provider: ProviderKind,

    /// Model name (defaults to the backend's default model)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Sampling temperature
    #[arg(long, global = true, default_value_t = 0.5)]
    pub temperature: f32,

    /// Maximum tokens per completion
    #[arg(long, global = true, default_value_t = 2048)]
    pub max_tokens: u32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Ollama,
    Groq,
    Openai,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the agent loop on one question
    Ask {
        /// The question (prompted for on stdin when omitted)
        query: Option<String>,

        /// Iteration budget
        #[arg(long, default_value_t = 10)]
        max_steps: usize,

        /// Oracle calls per iteration before giving up on a parseable reply
        #[arg(long, default_value_t = 3)]
        retry_limit: usize,

        /// Episodes kept in the prompt history
        #[arg(long, default_value_t = 4)]
        history_limit: usize,

        /// Text appended to every human reply
        #[arg(long, value_name = "TEXT")]
        human_suffix: Option<String>,
    },

    /// Answer with a single retrieve-then-generate call (vanilla RAG)
    Baseline {
        /// The question (ignored when --dataset is given)
        #[arg(required_unless_present = "dataset")]
        query: Option<String>,

        /// MultiHop-RAG style query file to evaluate
        #[arg(long, value_name = "PATH")]
        dataset: Option<PathBuf>,

        /// Number of dataset records to process
        #[arg(long, default_value_t = 50)]
        limit: usize,

        /// Where to write dataset results
        #[arg(long, value_name = "PATH", default_value = "output/vanilla_rag.json")]
        output: PathBuf,
    },
}
