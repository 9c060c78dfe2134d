//! Error types for the ContextClaw domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Window, fact store,
//! digest, and prompt assembly are total and never produce these; only the
//! external collaborators and configuration can fail.

use thiserror::Error;

/// The top-level error type for all ContextClaw operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Compaction collaborators ---
    #[error("Compaction error: {0}")]
    Compaction(#[from] CompactionError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by the external summarizer / fact extractor.
///
/// Malformed extractor *output* is not an error; see
/// [`FactExtraction::Invalid`](crate::fact::FactExtraction::Invalid).
#[derive(Debug, Clone, Error)]
pub enum CompactionError {
    #[error("Summarizer failed: {0}")]
    SummarizerFailed(String),

    #[error("Fact extractor failed: {0}")]
    ExtractorFailed(String),
}
