//! Bounded Episode History
//!
//! The agent's short-term memory: the last few iteration transcripts, fed back
//! into every prompt. Oldest entries are evicted first.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default number of episodes kept
pub const DEFAULT_HISTORY_LIMIT: usize = 4;

/// Fixed-capacity FIFO log of episode transcripts
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "StoredHistory")]
pub struct History {
    episodes: VecDeque<String>,
    limit: usize,
}

/// Serialized form, validated before it becomes a `History`
#[derive(Deserialize)]
struct StoredHistory {
    episodes: VecDeque<String>,
    limit: usize,
}

impl TryFrom<StoredHistory> for History {
    type Error = String;

    fn try_from(stored: StoredHistory) -> Result<Self, Self::Error> {
        if stored.limit == 0 {
            return Err("history limit must be at least 1".into());
        }
        Ok(Self::seeded(stored.limit, stored.episodes))
    }
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a specific capacity (at least one entry)
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            episodes: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Seed with prior episodes, keeping only the newest `limit`
    pub fn seeded<I, S>(limit: usize, episodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut history = Self::with_limit(limit);
        for episode in episodes {
            history.push(episode);
        }
        history
    }

    /// Append an episode, evicting the oldest when full
    pub fn push(&mut self, episode: impl Into<String>) {
        while self.episodes.len() >= self.limit.max(1) {
            self.episodes.pop_front();
        }
        self.episodes.push_back(episode.into());
        tracing::debug!(len = self.episodes.len(), "History updated");
    }

    /// Remove and return the newest episode
    pub fn pop(&mut self) -> Option<String> {
        self.episodes.pop_back()
    }

    /// Newest episode
    pub fn last(&self) -> Option<&str> {
        self.episodes.back().map(String::as_str)
    }

    /// Episodes oldest first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.episodes.iter().map(String::as_str)
    }

    /// Episodes joined by a blank line, oldest first
    pub fn render(&self) -> String {
        self.iter().collect::<Vec<_>>().join("\n\n")
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }
}
