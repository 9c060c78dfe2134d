//! Durable facts and the tolerant parser for fact-extractor output.
//!
//! A [`Fact`] outlives the recency window. Extractors hand back raw model
//! text, which is parsed into a tagged [`FactExtraction`] so malformed
//! output degrades to "no facts" instead of an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored key/value fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// The key as last written (not case-folded).
    pub key: String,

    /// The fact itself.
    pub value: String,

    /// Where the fact came from (turn, tool, extractor name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// When this record was last written.
    pub updated_at: DateTime<Utc>,
}

impl Fact {
    /// Canonical form of a key: case-folded.
    pub fn canonical_key(key: &str) -> String {
        key.to_lowercase()
    }
}

/// A fact proposed by an extractor, before it is stamped and stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactCandidate {
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl FactCandidate {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Outcome of parsing raw extractor output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactExtraction {
    /// Well-formed output; may legitimately be empty.
    Parsed(Vec<FactCandidate>),
    /// Output could not be parsed into the expected structure.
    Invalid { reason: String },
}

impl FactExtraction {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }

    /// The parsed candidates, or nothing if the output was malformed.
    pub fn into_candidates(self) -> Vec<FactCandidate> {
        match self {
            Self::Parsed(candidates) => candidates,
            Self::Invalid { .. } => Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExtraction {
    List(Vec<serde_json::Value>),
    Wrapped { facts: Vec<serde_json::Value> },
}

#[derive(Deserialize)]
struct RawCandidate {
    key: String,
    value: serde_json::Value,
    #[serde(default)]
    source: Option<String>,
}

impl RawCandidate {
    /// Strings pass through; numbers and booleans are stringified.
    fn into_candidate(self) -> Option<FactCandidate> {
        if self.key.trim().is_empty() {
            return None;
        }
        let value = match self.value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        Some(FactCandidate {
            key: self.key,
            value,
            source: self.source,
        })
    }
}

/// Parse extractor output into fact candidates.
///
/// Accepts a JSON array of `{key, value, source?}` objects or an object
/// with a `facts` array, optionally wrapped in a markdown code fence.
/// Only a malformed envelope makes the whole extraction invalid; individual
/// items that are not facts (blank key, missing or structured value) are
/// dropped and the rest are kept.
pub fn parse_fact_candidates(raw: &str) -> FactExtraction {
    let body = strip_code_fence(raw.trim());
    if body.is_empty() {
        return FactExtraction::Invalid {
            reason: "empty extractor output".into(),
        };
    }

    match serde_json::from_str::<RawExtraction>(body) {
        Ok(RawExtraction::List(items)) | Ok(RawExtraction::Wrapped { facts: items }) => {
            FactExtraction::Parsed(
                items
                    .into_iter()
                    .filter_map(|item| serde_json::from_value::<RawCandidate>(item).ok())
                    .filter_map(RawCandidate::into_candidate)
                    .collect(),
            )
        }
        Err(e) => FactExtraction::Invalid {
            reason: e.to_string(),
        },
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
