//! Ask Human Capability
//!
//! Forwards the model's question to a person and returns the reply verbatim.

use std::sync::Arc;

use agent_core::{Capability, Result as CoreResult};
use async_trait::async_trait;

use crate::human::HumanInput;

const USAGE: &str = "Asks a human for help. Use it when the retrieved information is not useful \
or when you need directions on how to proceed. Input is the question for the human. Do not ask \
the human to analyse the documents or to give the final answer.";

/// Capability that summons a human
pub struct AskHuman {
    human: Arc<dyn HumanInput>,
    suffix: Option<String>,
}

impl AskHuman {
    pub fn new(human: Arc<dyn HumanInput>) -> Self {
        Self {
            human,
            suffix: None,
        }
    }

    /// Append fixed text to every reply before the model sees it
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    fn summons(question: &str) -> String {
        format!(
            "You have been summoned by the agent to help with the query: {question}\n\
             Answer it the best you can so it helps the agent: "
        )
    }
}

#[async_trait]
impl Capability for AskHuman {
    fn name(&self) -> &str {
        "askhuman"
    }

    fn usage(&self) -> &str {
        USAGE
    }

    async fn execute(&self, input: &str) -> CoreResult<String> {
        let mut reply = self.human.prompt(&Self::summons(input)).await?;
        tracing::debug!(chars = reply.len(), "Human replied");

        if let Some(suffix) = &self.suffix {
            reply.push_str(suffix);
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, ToolsError};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CannedHuman {
        reply: Option<String>,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HumanInput for CannedHuman {
        async fn prompt(&self, message: &str) -> Result<String> {
            self.seen.lock().unwrap().push(message.to_string());
            self.reply
                .clone()
                .ok_or_else(|| ToolsError::HumanInput("no reply".into()))
        }
    }

    fn canned(reply: &str) -> Arc<CannedHuman> {
        Arc::new(CannedHuman {
            reply: Some(reply.into()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_returns_reply_verbatim() {
        let human = canned("Try searching for the AI Office");
        let output = AskHuman::new(human.clone())
            .execute("Where should I look?")
            .await
            .unwrap();

        assert_eq!(output, "Try searching for the AI Office");
        let seen = human.seen.lock().unwrap();
        assert_eq!(
            seen[0],
            "You have been summoned by the agent to help with the query: Where should I look?\n\
             Answer it the best you can so it helps the agent: "
        );
    }

    #[tokio::test]
    async fn test_suffix_appended() {
        let output = AskHuman::new(canned("Look again."))
            .with_suffix(" Do not irritate me again by asking for help")
            .execute("Help?")
            .await
            .unwrap();

        assert_eq!(output, "Look again. Do not irritate me again by asking for help");
    }

    #[tokio::test]
    async fn test_missing_reply_is_capability_error() {
        let human = Arc::new(CannedHuman::default());
        let err = AskHuman::new(human).execute("Help?").await.unwrap_err();
        assert!(matches!(err, agent_core::AgentError::CapabilityExecution(_)));
    }
}
