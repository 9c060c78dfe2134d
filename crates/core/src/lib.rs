//! # ContextClaw Core
//!
//! Domain types, traits, and error definitions for the ContextClaw context
//! assembler. This crate has **zero framework dependencies**: it defines the
//! domain model that the memory, agent, and CLI crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external capability is a trait here. The token counter, the
//! summarizer, and the fact extractor are all injected, so the assembler
//! never talks to a model or a tokenizer directly.

pub mod compaction;
pub mod error;
pub mod fact;
pub mod message;
pub mod token;

// Re-export key types at crate root for ergonomics
pub use compaction::{FactExtractor, Summarizer};
pub use error::{CompactionError, Error, Result};
pub use fact::{Fact, FactCandidate, FactExtraction, parse_fact_candidates};
pub use message::{Message, Role, SessionId};
pub use token::TokenCounter;
