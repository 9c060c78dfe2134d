//! Token counting capability.
//!
//! The assembler never tokenizes text itself; it asks an injected
//! [`TokenCounter`] for the cost of a whole candidate prompt. Counters are
//! assumed deterministic for a fixed input and monotonic in content length.

use crate::message::Message;

/// Maps an ordered message sequence to an integer cost.
pub trait TokenCounter: Send + Sync {
    fn count(&self, messages: &[Message]) -> usize;
}

impl<F> TokenCounter for F
where
    F: Fn(&[Message]) -> usize + Send + Sync,
{
    fn count(&self, messages: &[Message]) -> usize {
        self(messages)
    }
}
