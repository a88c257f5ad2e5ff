//! Error Types for Retrieval Tools

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolsError>;

#[derive(Error, Debug)]
pub enum ToolsError {
    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Human input unavailable: {0}")]
    HumanInput(String),

    #[error("Index database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ToolsError> for AgentError {
    fn from(err: ToolsError) -> Self {
        Self::CapabilityExecution(err.to_string())
    }
}
