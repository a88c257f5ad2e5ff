//! Reasoning Loop
//!
//! Implements the ReAct (Reason + Act) pattern. Each iteration the agent asks the
//! oracle for a thought and an action, runs the action through a capability, and
//! records the observation in its bounded history until it finishes, asks for an
//! action nobody provides, or runs out of steps.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::capability::{CapabilityRegistry, FINISH, Observation};
use crate::error::{AgentError, Result};
use crate::extract::Decision;
use crate::history::History;
use crate::message::Message;
use crate::prompt::{REACT_SYSTEM_PROMPT, render_iteration_prompt};
use crate::provider::{GenerationOptions, LlmProvider};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt sent with every request
    pub system_prompt: String,

    /// Maximum loop iterations before giving up
    pub max_steps: usize,

    /// Oracle calls per iteration before settling for an empty decision
    pub retry_limit: usize,

    /// Generation options
    pub generation: GenerationOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: REACT_SYSTEM_PROMPT.into(),
            max_steps: 10,
            retry_limit: 3,
            generation: GenerationOptions::default(),
        }
    }
}

/// Why a run stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The model chose `finish`
    Finished,
    /// The model asked for an action with no registered capability
    NoMatchingCapability,
    /// `max_steps` iterations ran without finishing
    StepBudgetExhausted,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Finished => write!(f, "finished"),
            Self::NoMatchingCapability => write!(f, "no matching capability"),
            Self::StepBudgetExhausted => write!(f, "step budget exhausted"),
        }
    }
}

/// Result of one agent run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Most recent history entry at loop exit
    pub answer: String,

    /// Why the loop stopped
    pub termination: Termination,

    /// Iterations that consulted the oracle
    pub iterations_used: usize,
}

/// Progress hook, called as the loop runs
pub trait AgentObserver: Send + Sync {
    fn on_query(&self, _query: &str) {}

    fn on_decision(&self, _iteration: usize, _decision: &Decision) {}

    fn on_observation(&self, _iteration: usize, _observation: &Observation) {}

    fn on_termination(&self, _outcome: &RunOutcome) {}
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    capabilities: CapabilityRegistry,
    history: History,
    config: AgentConfig,
    descriptions: String,
    observer: Option<Arc<dyn AgentObserver>>,
}

impl Agent {
    /// Create a new agent
    ///
    /// `max_steps` and `retry_limit` below one are raised to one.
    pub fn new(
        capabilities: CapabilityRegistry,
        history: History,
        provider: Arc<dyn LlmProvider>,
        mut config: AgentConfig,
    ) -> Self {
        config.max_steps = config.max_steps.max(1);
        config.retry_limit = config.retry_limit.max(1);
        let descriptions = capabilities.describe();

        tracing::info!(capabilities = ?capabilities.names(), "ReAct agent initialized");

        Self {
            provider,
            capabilities,
            history,
            config,
            descriptions,
            observer: None,
        }
    }

    /// Attach a progress observer
    pub fn with_observer(mut self, observer: Arc<dyn AgentObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run the loop for `query` until it finishes, fails to dispatch, or exhausts its steps
    pub async fn run(&mut self, query: &str) -> Result<RunOutcome> {
        tracing::info!(query, "Running query");
        if let Some(observer) = &self.observer {
            observer.on_query(query);
        }

        let mut iteration = 1;
        let termination = loop {
            if iteration > self.config.max_steps {
                tracing::warn!(max_steps = self.config.max_steps, "Step budget exhausted");
                break Termination::StepBudgetExhausted;
            }

            tracing::info!(iteration, "Iteration");
            let decision = self.decide(query).await?;
            if let Some(observer) = &self.observer {
                observer.on_decision(iteration, &decision);
            }

            let action = decision.action.trim().to_lowercase();
            if action == FINISH {
                tracing::info!("Finish action received. Exiting loop.");
                self.history.push(decision.input);
                break Termination::Finished;
            }

            let Some(capability) = self.capabilities.get(&action) else {
                tracing::error!(action = %decision.action, "No matching capability found for action");
                break Termination::NoMatchingCapability;
            };

            tracing::info!(capability = %action, "Using capability");
            let observation = match capability.execute(&decision.input).await {
                Ok(output) => Observation::success(&action, output),
                Err(e) => {
                    tracing::warn!(capability = %action, error = %e, "Capability failed");
                    Observation::failure(&action, e.to_string())
                }
            };
            if let Some(observer) = &self.observer {
                observer.on_observation(iteration, &observation);
            }

            self.history.push(format_episode(iteration, &decision, &action, &observation));
            iteration += 1;
        };

        let iterations_used = match termination {
            Termination::StepBudgetExhausted => iteration - 1,
            Termination::Finished | Termination::NoMatchingCapability => iteration,
        };

        let outcome = RunOutcome {
            answer: self.history.pop().unwrap_or_default(),
            termination,
            iterations_used,
        };

        tracing::info!(termination = %outcome.termination, iterations = outcome.iterations_used, "Agent loop finished.");
        if let Some(observer) = &self.observer {
            observer.on_termination(&outcome);
        }

        Ok(outcome)
    }

    /// Ask the oracle for the next decision, re-sending the same prompt on unparseable output
    async fn decide(&self, query: &str) -> Result<Decision> {
        let prompt = render_iteration_prompt(query, &self.history.render(), &self.descriptions);
        let messages = [
            Message::system(self.config.system_prompt.as_str()),
            Message::user(prompt),
        ];
        tracing::debug!(
            prompt_tokens = messages.iter().map(Message::estimate_tokens).sum::<u32>(),
            "Prompt built"
        );

        for attempt in 1..=self.config.retry_limit {
            let completion = self
                .provider
                .complete(&messages, &self.config.generation)
                .await?;

            if let Some(decision) = Decision::parse(&completion.content) {
                return Ok(decision);
            }
            tracing::warn!(attempt, "No structured output in response");
        }

        tracing::error!(retries = self.config.retry_limit, "Failed to decode JSON after retries");
        Ok(Decision::empty())
    }

    /// Episodes fed into the next prompt
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Get the capability registry
    pub fn capabilities(&self) -> &CapabilityRegistry {
        &self.capabilities
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

fn format_episode(
    iteration: usize,
    decision: &Decision,
    action: &str,
    observation: &Observation,
) -> String {
    format!(
        "THOUGHT {iteration}: {}\nACTION {iteration}: {action}\nACTION INPUT {iteration}: {}\nOBSERVATION {iteration}: {observation}",
        decision.thought, decision.input,
    )
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    capabilities: CapabilityRegistry,
    history: Option<History>,
    history_limit: usize,
    config: AgentConfig,
    observer: Option<Arc<dyn AgentObserver>>,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            capabilities: CapabilityRegistry::new(),
            history: None,
            history_limit: crate::history::DEFAULT_HISTORY_LIMIT,
            config: AgentConfig::default(),
            observer: None,
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn capability<C: crate::capability::Capability + 'static>(mut self, capability: C) -> Self {
        self.capabilities.register(capability);
        self
    }

    pub fn capabilities(mut self, capabilities: CapabilityRegistry) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Start from an existing (possibly seeded) history
    pub fn history(mut self, history: History) -> Self {
        self.history = Some(history);
        self
    }

    pub const fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn generation(mut self, generation: GenerationOptions) -> Self {
        self.config.generation = generation;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub const fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub const fn max_steps(mut self, max: usize) -> Self {
        self.config.max_steps = max;
        self
    }

    pub const fn retry_limit(mut self, limit: usize) -> Self {
        self.config.retry_limit = limit;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn AgentObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self.provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        if self.config.max_steps == 0 {
            return Err(AgentError::Config("max_steps must be at least 1".into()));
        }
        if self.config.retry_limit == 0 {
            return Err(AgentError::Config("retry_limit must be at least 1".into()));
        }
        let history_limit = self.history.as_ref().map_or(self.history_limit, History::limit);
        if history_limit == 0 {
            return Err(AgentError::Config("history_limit must be at least 1".into()));
        }

        let history = self
            .history
            .unwrap_or_else(|| History::with_limit(self.history_limit));
        let agent = Agent::new(self.capabilities, history, provider, self.config);

        Ok(match self.observer {
            Some(observer) => agent.with_observer(observer),
            None => agent,
        })
    }
}
