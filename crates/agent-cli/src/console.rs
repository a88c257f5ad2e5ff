//! Console Transcript
//!
//! Prints each step of an agent run as it happens.

use std::io::Write;
use std::sync::Mutex;

use agent_core::{AgentError, AgentObserver, Decision, Observation, RunOutcome, Termination};

/// Observer that writes the Thought/Action/Observation transcript
pub struct Transcript<W: Write + Send> {
    out: Mutex<W>,
}

impl Transcript<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> Transcript<W> {
    pub const fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn emit(&self, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            if let Err(e) = writeln!(out, "{text}").and_then(|()| out.flush()) {
                tracing::debug!(error = %e, "Transcript write failed");
            }
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Closing line for a finished run
pub fn closing_line(outcome: &RunOutcome) -> String {
    match outcome.termination {
        Termination::Finished => format!("FINAL ANSWER: {}", outcome.answer),
        Termination::NoMatchingCapability => format!(
            "STOPPED: the model chose an action no capability provides (last step: {})",
            outcome.answer
        ),
        Termination::StepBudgetExhausted => format!(
            "STOPPED: no answer after {} steps (last step: {})",
            outcome.iterations_used, outcome.answer
        ),
    }
}

/// What to tell the user when a command fails
pub fn failure_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<AgentError>() {
        Some(agent_err) if agent_err.is_retryable() => {
            format!("{} (temporary, retrying later may help)", agent_err.user_message())
        }
        Some(agent_err) => agent_err.user_message(),
        None => format!("Error: {err:#}"),
    }
}

impl<W: Write + Send> AgentObserver for Transcript<W> {
    fn on_query(&self, query: &str) {
        self.emit(&format!("QUESTION: {query}\n"));
    }

    fn on_decision(&self, iteration: usize, decision: &Decision) {
        self.emit(&format!(
            "THOUGHT {iteration}: {}\nACTION {iteration}: {}\nACTION INPUT {iteration}: {}",
            decision.thought, decision.action, decision.input
        ));
    }

    fn on_observation(&self, iteration: usize, observation: &Observation) {
        self.emit(&format!("OBSERVATION {iteration}: {observation}\n"));
    }

    fn on_termination(&self, outcome: &RunOutcome) {
        self.emit(&closing_line(outcome));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(termination: Termination) -> RunOutcome {
        RunOutcome {
            answer: "European Commission".into(),
            termination,
            iterations_used: 4,
        }
    }

    #[test]
    fn test_closing_line_per_termination() {
        assert_eq!(
            closing_line(&outcome(Termination::Finished)),
            "FINAL ANSWER: European Commission"
        );
        assert!(closing_line(&outcome(Termination::NoMatchingCapability)).starts_with("STOPPED"));
        assert!(
            closing_line(&outcome(Termination::StepBudgetExhausted)).contains("after 4 steps")
        );
    }

    #[test]
    fn test_failure_message_per_error_kind() {
        let auth = anyhow::Error::from(AgentError::Auth("401".into()));
        assert_eq!(
            failure_message(&auth),
            "Authentication failed. Please check your credentials."
        );

        let limited = anyhow::Error::from(AgentError::RateLimited("429".into()))
            .context("agent run failed");
        assert!(failure_message(&limited).starts_with("You've made too many requests"));
        assert!(failure_message(&limited).ends_with("retrying later may help)"));

        let other = anyhow::anyhow!("missing corpus").context("failed to index corpus");
        assert_eq!(failure_message(&other), "Error: failed to index corpus: missing corpus");
    }

    #[test]
    fn test_closed_output_does_not_panic() {
        struct Closed;

        impl Write for Closed {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::ErrorKind::BrokenPipe.into())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let transcript = Transcript::new(Closed);
        transcript.on_query("Who?");
        transcript.on_termination(&outcome(Termination::Finished));
    }

    #[test]
    fn test_transcript_lines() {
        let transcript = Transcript::new(Vec::new());
        transcript.on_decision(1, &Decision::new("look it up", "retrieve", "AI Office"));
        transcript.on_observation(1, &Observation::failure("retrieve", "index offline"));
        transcript.on_termination(&outcome(Termination::Finished));

        let text = String::from_utf8(transcript.into_inner()).unwrap();
        assert_eq!(
            text,
            "THOUGHT 1: look it up\nACTION 1: retrieve\nACTION INPUT 1: AI Office\n\
             OBSERVATION 1: Error: index offline\n\n\
             FINAL ANSWER: European Commission\n"
        );
    }
}
