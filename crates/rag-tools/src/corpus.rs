//! News Corpus
//!
//! Loading the article corpus and splitting it into overlapping chunks for retrieval.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolsError};
use crate::retriever::Metadata;

/// Default chunk size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between consecutive chunks in characters
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Separators tried in order, from paragraph to single character
const SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// One article of the corpus file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub published_at: String,
    pub source: String,
    pub body: String,
}

impl Article {
    /// Metadata carried by every chunk of this article
    pub fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::default();
        metadata.insert("title", &self.title);
        metadata.insert("published_at", &self.published_at);
        metadata.insert("source", &self.source);
        metadata
    }
}

/// A retrievable unit of text with its metadata
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    pub metadata: Metadata,
}

/// Read a JSON array of articles
pub fn load_articles(path: impl AsRef<Path>) -> Result<Vec<Article>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ToolsError::Corpus(format!("cannot read {}: {e}", path.display()))
    })?;
    let articles: Vec<Article> = serde_json::from_str(&raw)?;

    tracing::debug!(path = %path.display(), articles = articles.len(), "Corpus loaded");
    Ok(articles)
}

/// Load the corpus and split every article into chunked documents
pub fn load_corpus(path: impl AsRef<Path>, splitter: &TextSplitter) -> Result<Vec<Document>> {
    let articles = load_articles(path)?;
    let documents: Vec<Document> = articles
        .iter()
        .flat_map(|article| {
            let metadata = article.metadata();
            splitter
                .split(&article.body)
                .into_iter()
                .map(move |text| Document {
                    text,
                    metadata: metadata.clone(),
                })
        })
        .collect();

    tracing::info!(
        articles = articles.len(),
        chunks = documents.len(),
        "Corpus indexed"
    );
    Ok(documents)
}

/// Recursive character splitter
///
/// Splits on the coarsest separator present, recurses into pieces that are still too
/// long, then greedily merges neighbours back up to `chunk_size` keeping roughly
/// `chunk_overlap` characters of context between consecutive chunks.
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl TextSplitter {
    /// Overlap is clamped below the chunk size
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub const fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let position = separators
            .iter()
            .position(|sep| sep.is_empty() || text.contains(sep))
            .unwrap_or(separators.len().saturating_sub(1));
        let separator = separators.get(position).copied().unwrap_or("");
        let finer = separators.get(position + 1..).unwrap_or_default();

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|s| !s.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();
        for piece in pieces {
            if char_len(piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                chunks.extend(self.merge(&pending, separator));
                pending.clear();
            }
            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_with(piece, finer));
            }
        }
        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, separator));
        }
        chunks
    }

    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: Vec<&str> = Vec::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);
            let joiner = if window.is_empty() { 0 } else { sep_len };

            if total + len + joiner > self.chunk_size && !window.is_empty() {
                push_trimmed(&mut chunks, &window.join(separator));

                while total > self.chunk_overlap
                    || (total > 0
                        && total + len + if window.is_empty() { 0 } else { sep_len }
                            > self.chunk_size)
                {
                    let first = window.remove(0);
                    total -= char_len(first) + if window.is_empty() { 0 } else { sep_len };
                }
            }

            total += len + if window.is_empty() { 0 } else { sep_len };
            window.push(piece);
        }

        push_trimmed(&mut chunks, &window.join(separator));
        chunks
    }
}

fn push_trimmed(chunks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = TextSplitter::default().split("A short article body.");
        assert_eq!(chunks, vec!["A short article body."]);
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        let text = (0..400).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ");
        let splitter = TextSplitter::new(100, 20);
        let chunks = splitter.split(&text);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 100));

        // Consecutive chunks share trailing words
        let last_word = chunks[0].rsplit(' ').next().unwrap();
        assert!(chunks[1].contains(last_word));
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let first = "a".repeat(60);
        let second = "b".repeat(60);
        let text = format!("{first}\n\n{second}");
        let chunks = TextSplitter::new(100, 0).split(&text);

        assert_eq!(chunks, vec![first, second]);
    }

    #[test]
    fn test_unbroken_text_falls_back_to_characters() {
        let text = "x".repeat(250);
        let chunks = TextSplitter::new(100, 0).split(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 50);
    }

    #[test]
    fn test_overlap_clamped() {
        let splitter = TextSplitter::new(10, 50);
        assert_eq!(splitter.chunk_overlap(), 9);
    }

    #[test]
    fn test_load_corpus_attaches_metadata() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"title": "EU opens inquiry", "published_at": "2023-11-27T23:29:10+00:00",
                "source": "TechCrunch", "author": "ignored", "body": "The Commission said so."}}]"#
        )
        .unwrap();

        let documents = load_corpus(file.path(), &TextSplitter::default()).unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].text, "The Commission said so.");
        assert_eq!(documents[0].metadata.get("source"), Some("TechCrunch"));
    }

    #[test]
    fn test_missing_corpus_is_error() {
        let err = load_articles("/nonexistent/corpus.json").unwrap_err();
        assert!(matches!(err, ToolsError::Corpus(_)));
    }
}
