//! Structured Output Extraction
//!
//! Turns the oracle's free text into a [`Decision`]. The model is asked for a bare
//! JSON object but routinely wraps it in prose or code fences, so parsing is two-tier:
//!
//! 1. the whole response as a JSON object;
//! 2. the first minimal `{...}` span found in the response.
//!
//! Only the first span is tried. A malformed first block hides a valid later one.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder for a field the model did not provide
pub const EMPTY: &str = "Empty";

static BRACE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*?\}").expect("brace pattern is valid"));

/// One iteration's structured model output
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub thought: String,
    pub action: String,
    pub input: String,
}

impl Decision {
    pub fn new(
        thought: impl Into<String>,
        action: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        Self {
            thought: thought.into(),
            action: action.into(),
            input: input.into(),
        }
    }

    /// Decision used when nothing could be extracted
    pub fn empty() -> Self {
        Self::new(EMPTY, EMPTY, EMPTY)
    }

    /// Build from an extracted object, defaulting missing fields to [`EMPTY`]
    pub fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            thought: field(object, "thought"),
            action: field(object, "action"),
            input: field(object, "input"),
        }
    }

    /// Extract a decision from raw model output
    pub fn parse(text: &str) -> Option<Self> {
        extract_object(text).map(|object| Self::from_object(&object))
    }
}

fn field(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => EMPTY.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Parse `text` as a JSON object, falling back to its first brace-delimited block.
///
/// Returns `None` when neither attempt yields an object.
pub fn extract_object(text: &str) -> Option<Map<String, Value>> {
    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(text) {
        return Some(object);
    }

    tracing::warn!("JSON decode error. Trying manual extraction.");
    let block = BRACE_BLOCK.find(text)?;
    match serde_json::from_str::<Value>(block.as_str()) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}
