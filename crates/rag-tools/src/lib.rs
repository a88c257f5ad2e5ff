//! # rag-tools
//!
//! Capabilities the ReAct agent can dispatch to: passage retrieval over a news
//! corpus and a human-in-the-loop prompt.
//!
//! ```text
//! corpus.json ──► TextSplitter ──► KeywordRetriever (SQLite FTS5) ──► Retrieve  ("retrieve")
//!                                                                      AskHuman  ("askhuman")
//! ```

pub mod svckit;
pub mod retriever;
pub mod corpus;
pub mod human;
pub mod error;

pub use corpus::{Article, Document, TextSplitter, load_corpus};
pub use error::{Result, ToolsError};
pub use human::{HumanInput, StdinHuman};
pub use retriever::{KeywordRetriever, Metadata, Passage, Retriever, render_context};

/// Re-export capabilities for easy registration
pub mod tools {
    pub use crate::svckit::{AskHuman, Retrieve};
}
