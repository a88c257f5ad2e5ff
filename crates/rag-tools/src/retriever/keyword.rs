//! Keyword Retriever
//!
//! SQLite FTS5 index over corpus chunks, ranked with bm25. The on-disk index is
//! built once per corpus file and reused on later starts.

use std::path::Path;
use std::str::FromStr;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{ConnectOptions, Row};

use super::{Metadata, Passage, Retriever};
use crate::corpus::{Document, TextSplitter, load_corpus};
use crate::error::{Result, ToolsError};

const FINGERPRINT_KEY: &str = "corpus_fingerprint";

/// Full-text keyword retriever backed by SQLite
pub struct KeywordRetriever {
    pool: SqlitePool,
    chunks: usize,
    reused: bool,
}

impl KeywordRetriever {
    /// Open the index at `index_path`, building it from `corpus` when it is
    /// missing or was built from a different corpus file or splitter
    pub async fn open(index_path: &Path, corpus: &Path, splitter: &TextSplitter) -> Result<Self> {
        let fingerprint = fingerprint(corpus, splitter)?;

        if let Some(parent) = index_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", index_path.display()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .disable_statement_logging();
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        migrate(&pool).await?;

        let stored: Option<String> =
            sqlx::query_scalar("SELECT value FROM index_state WHERE key = ?")
                .bind(FINGERPRINT_KEY)
                .fetch_optional(&pool)
                .await?;
        let chunks = count(&pool).await?;

        if chunks > 0 && stored.as_deref() == Some(fingerprint.as_str()) {
            tracing::info!(path = %index_path.display(), chunks, "Reusing keyword index");
            return Ok(Self {
                pool,
                chunks,
                reused: true,
            });
        }

        let documents = load_corpus(corpus, splitter)?;
        if documents.is_empty() {
            return Err(ToolsError::Corpus("corpus contains no text".into()));
        }
        tracing::info!(path = %index_path.display(), chunks = documents.len(), "Building keyword index");
        let chunks = rebuild(&pool, &documents, &fingerprint).await?;

        Ok(Self {
            pool,
            chunks,
            reused: false,
        })
    }

    /// Index `documents` in a private in-memory database
    pub async fn in_memory(documents: Vec<Document>) -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.disable_statement_logging();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        migrate(&pool).await?;
        let chunks = rebuild(&pool, &documents, "memory").await?;

        Ok(Self {
            pool,
            chunks,
            reused: false,
        })
    }

    /// Whether `open` found an up-to-date index instead of building one
    pub const fn reused(&self) -> bool {
        self.reused
    }
}

#[async_trait]
impl Retriever for KeywordRetriever {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Passage>> {
        let Some(expression) = match_expression(query) else {
            return Err(ToolsError::Retrieval(format!(
                "query has no searchable terms: {query:?}"
            )));
        };
        let limit = i64::try_from(top_k).unwrap_or(i64::MAX);

        let rows = sqlx::query(
            r"
            SELECT text, metadata, rank
            FROM chunks_fts
            WHERE chunks_fts MATCH ?
            ORDER BY rank, rowid
            LIMIT ?
            ",
        )
        .bind(&expression)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(query, hits = rows.len(), "Keyword retrieval");

        rows.iter()
            .map(|row| -> Result<Passage> {
                let metadata: String = row.try_get("metadata")?;
                let pairs: Vec<(String, String)> = serde_json::from_str(&metadata)?;
                let rank: f64 = row.try_get("rank")?;
                #[allow(clippy::cast_possible_truncation)]
                let score = -rank as f32;
                Ok(Passage {
                    text: row.try_get("text")?,
                    metadata: Metadata::from(pairs),
                    score,
                })
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.chunks
    }

    fn name(&self) -> &str {
        "sqlite-fts5"
    }
}

async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(include_str!("../../migrations/001_chunks_fts.sql"))
        .execute(pool)
        .await?;
    Ok(())
}

async fn count(pool: &SqlitePool) -> Result<usize> {
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks_fts")
        .fetch_one(pool)
        .await?;
    Ok(usize::try_from(rows).unwrap_or(0))
}

/// Replace every indexed chunk in one transaction
async fn rebuild(pool: &SqlitePool, documents: &[Document], fingerprint: &str) -> Result<usize> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM chunks_fts").execute(&mut *tx).await?;
    for document in documents {
        sqlx::query("INSERT INTO chunks_fts (text, title, metadata) VALUES (?, ?, ?)")
            .bind(&document.text)
            .bind(document.metadata.get("title").unwrap_or_default())
            .bind(serde_json::to_string(document.metadata.pairs())?)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query("INSERT OR REPLACE INTO index_state (key, value) VALUES (?, ?)")
        .bind(FINGERPRINT_KEY)
        .bind(fingerprint)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(documents.len())
}

/// Identity of a corpus file plus the chunking applied to it
fn fingerprint(corpus: &Path, splitter: &TextSplitter) -> Result<String> {
    let file = std::fs::metadata(corpus).map_err(|e| {
        ToolsError::Corpus(format!("cannot read {}: {e}", corpus.display()))
    })?;
    let modified = file
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs());

    Ok(format!(
        "{}|{}|{modified}|{}|{}",
        corpus.display(),
        file.len(),
        splitter.chunk_size(),
        splitter.chunk_overlap()
    ))
}

/// Quote each word of the query and OR them together, so punctuation in free
/// text never reaches the FTS5 query parser
fn match_expression(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t.to_lowercase()))
        .collect();

    (!terms.is_empty()).then(|| terms.join(" OR "))
}
