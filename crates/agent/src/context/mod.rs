//! Bounded-memory context assembly.
//!
//! Decides, for every model call, which slice of history, durable facts,
//! and compacted narrative go into the prompt so it stays under a token
//! budget.
//!
//! # Context Segments (in prompt order)
//!
//! | Segment | Source | Degradation |
//! |---------|--------|-------------|
//! | 1. Prefix | Static system instructions | Never trimmed |
//! | 2. Summary | [`SessionSummary`] | Never trimmed |
//! | 3. Facts | [`FactStore`](contextclaw_memory::FactStore) | Capped by count |
//! | 4. Window | [`RecencyWindow`] | Oldest turn pairs dropped, then replaced by a nudge |
//! | 5. User | Current message | Never trimmed |

pub mod assembler;
pub mod digest;
pub mod summary;
pub mod token;
pub mod window;

pub use assembler::{
    AssembledPrompt, AssemblyInput, BuildOptions, DegradationStage, PromptAssembler,
};
pub use digest::digest;
pub use summary::SessionSummary;
pub use token::HeuristicCounter;
pub use window::RecencyWindow;
