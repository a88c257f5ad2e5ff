//! # agent-core
//!
//! ReAct question-answering loop with a provider-agnostic LLM abstraction and
//! pluggable capabilities.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                             Agent                                │
//! │  ┌───────────┐  ┌────────────┐  ┌──────────────┐  ┌───────────┐  │
//! │  │ Reasoning │  │ Capability │  │  Structured  │  │  Bounded  │  │
//! │  │   Loop    │──│  Registry  │  │  Extractor   │  │  History  │  │
//! │  └─────┬─────┘  └────────────┘  └──────────────┘  └───────────┘  │
//! │        │        ┌──────────────────────┐                         │
//! │        └────────│ LlmProvider (oracle) │                         │
//! │                 └──────────────────────┘                         │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each iteration renders the question, the last few episodes and the capability
//! descriptions into a prompt, extracts `{thought, action, input}` from the reply and
//! dispatches the action. `finish` ends the run.

pub mod provider;
pub mod capability;
pub mod extract;
pub mod history;
pub mod prompt;
pub mod reasoning;
pub mod message;
pub mod error;

pub use capability::{Capability, CapabilityDescriptor, CapabilityRegistry, Finish, Observation};
pub use error::{AgentError, Result};
pub use extract::Decision;
pub use history::History;
pub use message::{Message, Role};
pub use provider::LlmProvider;
pub use reasoning::{Agent, AgentBuilder, AgentConfig, AgentObserver, RunOutcome, Termination};
