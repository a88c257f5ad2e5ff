//! Passage Retrieval
//!
//! Abstractions over the search index the `retrieve` capability queries.

mod keyword;

pub use keyword::KeywordRetriever;

use async_trait::async_trait;
use serde::{Serialize, Serializer};

use crate::error::Result;

/// Retrieval backend trait (Strategy pattern)
///
/// Implement this for each index: keyword, vector store, remote search API.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return at most `top_k` passages, best match first
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Passage>>;

    /// Number of indexed passages
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Backend name
    fn name(&self) -> &str;
}

/// Ordered string metadata attached to a passage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata(Vec<(String, String)>);

impl Metadata {
    /// Insert or overwrite a key, keeping first-insertion order
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    /// `Key: value` lines for the model, keys capitalized
    pub fn render(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}: {v}", capitalize(k)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<(String, String)>> for Metadata {
    fn from(pairs: Vec<(String, String)>) -> Self {
        let mut metadata = Self::default();
        for (key, value) in pairs {
            metadata.insert(key, value);
        }
        metadata
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// A scored chunk returned by a retriever
#[derive(Debug, Clone, Serialize)]
pub struct Passage {
    pub text: String,
    pub metadata: Metadata,
    pub score: f32,
}

impl Passage {
    /// Metadata header, a blank line, then the chunk text
    pub fn render(&self) -> String {
        if self.metadata.is_empty() {
            return self.text.clone();
        }
        format!("{}\n\n{}", self.metadata.render(), self.text)
    }
}

/// Join passages into one context block
///
/// Blank lines inside each passage are collapsed so that a blank line only ever
/// separates two passages.
pub fn render_context(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| p.render().replace("\n\n", "\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
