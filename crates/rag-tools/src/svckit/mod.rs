//! Service Kit - Agent Capabilities
//!
//! Capabilities that implement `agent_core::Capability` for the question-answering agent.

mod retrieve;
mod ask_human;

pub use retrieve::Retrieve;
pub use ask_human::AskHuman;
