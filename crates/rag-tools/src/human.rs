//! Human Input
//!
//! Channel through which the agent, or the CLI, asks a person for text.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;

use crate::error::{Result, ToolsError};

/// Source of human answers
#[async_trait]
pub trait HumanInput: Send + Sync {
    /// Show `message` and return the reply without its line terminator
    async fn prompt(&self, message: &str) -> Result<String>;
}

/// Reads replies line by line from standard input
pub struct StdinHuman {
    reader: Mutex<BufReader<Stdin>>,
}

impl Default for StdinHuman {
    fn default() -> Self {
        Self::new()
    }
}

impl StdinHuman {
    pub fn new() -> Self {
        Self {
            reader: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }
}

#[async_trait]
impl HumanInput for StdinHuman {
    async fn prompt(&self, message: &str) -> Result<String> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(message.as_bytes()).await?;
        stdout.flush().await?;

        let mut line = String::new();
        let read = self.reader.lock().await.read_line(&mut line).await?;
        if read == 0 {
            return Err(ToolsError::HumanInput("standard input closed".into()));
        }

        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}
