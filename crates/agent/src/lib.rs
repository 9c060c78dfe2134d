//! Context assembly and session state for ContextClaw.
//!
//! For every model call the agent loop asks its [`Session`] for a prompt:
//!
//! 1. **Record** the previous exchange and any tool digests into the window
//! 2. **Compact** (after the reply) via external summarizer / fact extractor
//! 3. **Build** the next prompt: prefix + summary + facts + window + user,
//!    degraded turn by turn until it fits the token budget
//!
//! Model invocation, tool execution, and persistence live outside this crate.

pub mod context;
pub mod session;

pub use context::{
    AssembledPrompt, AssemblyInput, BuildOptions, DegradationStage, HeuristicCounter,
    PromptAssembler, RecencyWindow, SessionSummary, digest,
};
pub use session::{CompactionReport, Session};
