//! Session summary holder.
//!
//! Holds the compacted narrative produced by an external summarizer. It is
//! replaced wholesale, never merged, and never expires on its own.

/// The current compacted summary of the session (empty until first set).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    text: String,
}

impl SessionSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored summary unconditionally.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn get(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
