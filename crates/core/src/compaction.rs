//! Compaction collaborator traits.
//!
//! After a model reply, the surrounding agent loop asks a summarizer to
//! fold the newest turns into the running session summary and a fact
//! extractor to pull durable key/value facts out of them. Both usually call
//! a model, so both are async; their prompts are their own business.

use async_trait::async_trait;
use crate::error::CompactionError;
use crate::message::Message;

/// Produces an updated session summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// The summarizer name (for logs).
    fn name(&self) -> &str;

    /// Fold `new_turns` into `current_summary`, returning the replacement.
    async fn summarize(
        &self,
        current_summary: &str,
        new_turns: &[Message],
    ) -> std::result::Result<String, CompactionError>;
}

/// Produces raw fact-extraction output for recent turns.
///
/// The raw text is parsed with
/// [`parse_fact_candidates`](crate::fact::parse_fact_candidates).
#[async_trait]
pub trait FactExtractor: Send + Sync {
    /// The extractor name (for logs).
    fn name(&self) -> &str;

    async fn extract(&self, recent_turns: &[Message]) -> std::result::Result<String, CompactionError>;
}
