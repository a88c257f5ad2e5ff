//! react-agent
//!
//! Command-line runner for the ReAct question-answering agent and its vanilla RAG
//! baseline.

mod baseline;
mod cli;
mod console;
mod handlers;
mod setup;
mod telemetry;

use std::process::ExitCode;

use clap::Parser;

use crate::baseline::Baseline;
use crate::cli::{Cli, Command};
use crate::console::failure_message;
use crate::handlers::{AskOptions, handle_ask, handle_baseline_dataset, handle_baseline_query};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_file = (!cli.no_log_file).then_some(cli.log_file.as_path());
    if let Err(e) = telemetry::init_telemetry(log_file) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Run failed: {e:#}");
            eprintln!("{}", failure_message(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let oracle = setup::connect(&cli.llm).await?;
    let retriever = setup::open_index(&cli.index, &cli.corpus).await?;

    match cli.command {
        Command::Ask {
            query,
            max_steps,
            retry_limit,
            history_limit,
            human_suffix,
        } => {
            let options = AskOptions {
                max_steps,
                retry_limit,
                history_limit,
                top_k: cli.top_k,
                human_suffix,
            };
            handle_ask(oracle, retriever, query, options).await?;
        }

        Command::Baseline {
            query,
            dataset,
            limit,
            output,
        } => {
            let baseline = Baseline {
                provider: oracle.provider.as_ref(),
                generation: &oracle.generation,
                retriever: retriever.as_ref(),
                top_k: cli.top_k,
            };
            match (dataset, query) {
                (Some(dataset), _) => {
                    handle_baseline_dataset(&baseline, &dataset, limit, &output).await?;
                }
                (None, Some(query)) => handle_baseline_query(&baseline, &query).await?,
                (None, None) => anyhow::bail!("baseline needs a query or --dataset"),
            }
        }
    }

    Ok(())
}
