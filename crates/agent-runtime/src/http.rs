//! Shared HTTP client construction

use std::time::Duration;

use agent_core::error::{AgentError, Result};
use reqwest::Client;

/// Client with a whole-request timeout
pub fn client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| build_error(&e))
}

fn build_error(err: &reqwest::Error) -> AgentError {
    AgentError::Config(format!("failed to build HTTP client: {err}"))
}
