//! Prompt assembly with staged token-budget degradation.
//!
//! Every model call gets a freshly built message sequence with a fixed
//! segment order:
//!
//! 1. **Static prefix** (system instructions), verbatim
//! 2. **Session summary**, as one system message, only if non-empty
//! 3. **Known facts**, as one system message, only if any exist
//! 4. **Recent window**, the last `k` raw messages
//! 5. **User message**, always last and never shortened
//!
//! If the candidate exceeds the budget, the window is shrunk one
//! user/assistant pair at a time (`k -= 2`). If it still does not fit with
//! no window at all, the window segment is replaced by a fixed nudge telling
//! the model to rely on the summary and facts. The result may still be over
//! budget; that is reported, not enforced.
//!
//! # Determinism
//!
//! Assembly reads state and calls the token counter; it performs no I/O and
//! uses no time-dependent logic, so identical inputs give identical prompts.

use crate::context::summary::SessionSummary;
use crate::context::window::RecencyWindow;
use contextclaw_core::message::Message;
use contextclaw_core::token::TokenCounter;
use contextclaw_memory::FactStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default token budget for one assembled prompt.
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 3500;

/// Default starting window slice, in messages.
pub const DEFAULT_KEEP_TURNS: usize = 4;

/// Default number of facts rendered into the facts segment.
pub const DEFAULT_PROMPT_FACTS: usize = 20;

pub const SUMMARY_HEADER: &str = "[Session Summary]";
pub const FACTS_HEADER: &str = "[Known Facts]";

/// Stands in for the window once no raw history fits.
pub const FALLBACK_NUDGE: &str = "Earlier conversation turns were omitted to fit the context budget. \
Rely on the session summary and known facts above to continue.";

// ── Types ─────────────────────────────────────────────────────────────────

/// The state a prompt is assembled from. Borrowed, never retained.
pub struct AssemblyInput<'a> {
    /// Immutable system instructions.
    pub prefix: &'a [Message],
    /// Recent raw messages.
    pub window: &'a RecencyWindow,
    /// Compacted narrative.
    pub summary: &'a SessionSummary,
    /// Durable facts.
    pub facts: &'a FactStore,
}

/// Per-call knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Token budget for the whole prompt.
    pub max_input_tokens: usize,
    /// Starting window slice size, counted in messages.
    pub keep_turns: usize,
    /// Maximum facts rendered into the facts segment.
    pub prompt_facts: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_input_tokens: DEFAULT_MAX_INPUT_TOKENS,
            keep_turns: DEFAULT_KEEP_TURNS,
            prompt_facts: DEFAULT_PROMPT_FACTS,
        }
    }
}

/// How far degradation went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationStage {
    /// The first candidate fit.
    None,
    /// Window turns were dropped until the prompt fit.
    TurnShrink,
    /// No window fit; the fallback nudge replaced it.
    Fallback,
}

/// An assembled prompt, ready for a model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssembledPrompt {
    /// The ordered message sequence.
    pub messages: Vec<Message>,
    /// Measured cost of `messages`, not an estimate from before degradation.
    pub approx_tokens: usize,
    /// The budget the prompt was built against.
    pub budget: usize,
    /// Number of raw window messages included.
    pub window_messages: usize,
    /// Degradation stage reached.
    pub stage: DegradationStage,
}

impl AssembledPrompt {
    /// Whether the prompt is still over budget after full degradation.
    pub fn over_budget(&self) -> bool {
        self.approx_tokens > self.budget
    }
}

// ── Assembler ─────────────────────────────────────────────────────────────

/// The prompt assembler. Owns only the token counter; create one and reuse it.
#[derive(Clone)]
pub struct PromptAssembler {
    counter: Arc<dyn TokenCounter>,
}

impl PromptAssembler {
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        Self { counter }
    }

    /// Build the prompt for `user`, degrading the window to fit the budget.
    pub fn build_prompt(
        &self,
        input: &AssemblyInput<'_>,
        user: &Message,
        options: &BuildOptions,
    ) -> AssembledPrompt {
        let budget = options.max_input_tokens;
        let head = Self::head_segments(input, options.prompt_facts);

        let mut k = options.keep_turns;
        let mut window = input.window.slice(k);
        let mut messages = Self::compose(&head, &window, user);
        let mut tokens = self.counter.count(&messages);
        let mut stage = DegradationStage::None;

        // ── Stage 1: drop one user/assistant pair at a time ───────────────
        while tokens > budget && k > 0 {
            k = k.saturating_sub(2);
            window = input.window.slice(k);
            messages = Self::compose(&head, &window, user);
            tokens = self.counter.count(&messages);
            stage = DegradationStage::TurnShrink;
            debug!(k, tokens, budget, "Shrunk recency window by one turn");
        }

        // ── Stage 2: replace the window with the fallback nudge ───────────
        if tokens > budget {
            window.clear();
            let nudge = [Message::system(FALLBACK_NUDGE)];
            messages = Self::compose(&head, &nudge, user);
            tokens = self.counter.count(&messages);
            stage = DegradationStage::Fallback;
            warn!(tokens, budget, "No window history fits the budget, using fallback nudge");
            if tokens > budget {
                warn!(tokens, budget, "Assembled prompt remains over budget");
            }
        }

        AssembledPrompt {
            messages,
            approx_tokens: tokens,
            budget,
            window_messages: window.len(),
            stage,
        }
    }

    // ── Helpers ────────────────────────────────────────────────────────────

    /// Prefix, summary segment, and facts segment.
    fn head_segments(input: &AssemblyInput<'_>, prompt_facts: usize) -> Vec<Message> {
        let mut head = input.prefix.to_vec();

        if !input.summary.is_empty() {
            head.push(Message::system(format!(
                "{SUMMARY_HEADER}\n{}",
                input.summary.get()
            )));
        }

        let facts = input.facts.render_bullet_list(prompt_facts);
        if !facts.is_empty() {
            head.push(Message::system(format!("{FACTS_HEADER}\n{facts}")));
        }

        head
    }

    fn compose(head: &[Message], middle: &[Message], user: &Message) -> Vec<Message> {
        let mut messages = Vec::with_capacity(head.len() + middle.len() + 1);
        messages.extend_from_slice(head);
        messages.extend_from_slice(middle);
        messages.push(user.clone());
        messages
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::token::HeuristicCounter;
    use contextclaw_core::fact::FactCandidate;
    use contextclaw_core::message::Role;
    use std::sync::Mutex;

    // ── Helpers ────────────────────────────────────────────────────────

    /// Counts one token per message and records every measured length.
    #[derive(Default)]
    struct RecordingCounter {
        lengths: Mutex<Vec<usize>>,
    }

    impl TokenCounter for RecordingCounter {
        fn count(&self, messages: &[Message]) -> usize {
            self.lengths.lock().unwrap().push(messages.len());
            messages.len()
        }
    }

    fn three_turn_window() -> RecencyWindow {
        let mut window = RecencyWindow::default();
        for i in 0..3 {
            window.append(vec![
                Message::user(format!("question {i}")),
                Message::assistant(format!("answer {i}")),
            ]);
        }
        window
    }

    fn heuristic() -> PromptAssembler {
        PromptAssembler::new(Arc::new(HeuristicCounter))
    }

    fn options(max_input_tokens: usize, keep_turns: usize) -> BuildOptions {
        BuildOptions {
            max_input_tokens,
            keep_turns,
            ..BuildOptions::default()
        }
    }

    // ── Tests ──────────────────────────────────────────────────────────

    #[test]
    fn fits_without_degradation() {
        let prefix = vec![Message::system("You are helpful.")];
        let window = RecencyWindow::default();
        let summary = SessionSummary::new();
        let facts = FactStore::new();
        let input = AssemblyInput {
            prefix: &prefix,
            window: &window,
            summary: &summary,
            facts: &facts,
        };
        let user = Message::user("Hello");

        let asm = heuristic();
        let prompt = asm.build_prompt(&input, &user, &BuildOptions::default());

        assert_eq!(prompt.messages, vec![prefix[0].clone(), user]);
        assert_eq!(prompt.stage, DegradationStage::None);
        assert_eq!(prompt.window_messages, 0);
        assert_eq!(prompt.approx_tokens, HeuristicCounter.count(&prompt.messages));
        assert!(!prompt.over_budget());
    }

    #[test]
    fn segments_in_fixed_order() {
        let prefix = vec![Message::system("rules")];
        let window = three_turn_window();
        let mut summary = SessionSummary::new();
        summary.set("We discussed trains.");
        let mut facts = FactStore::new();
        facts.upsert(vec![FactCandidate::new("b", "2"), FactCandidate::new("a", "1")]);
        let input = AssemblyInput {
            prefix: &prefix,
            window: &window,
            summary: &summary,
            facts: &facts,
        };

        let prompt = heuristic().build_prompt(&input, &Message::user("next?"), &BuildOptions::default());

        let m = &prompt.messages;
        assert_eq!(m.len(), 1 + 1 + 1 + 4 + 1);
        assert_eq!(m[0].content, "rules");
        assert_eq!(m[1].content, "[Session Summary]\nWe discussed trains.");
        assert_eq!(m[2].content, "[Known Facts]\n- a: 1\n- b: 2");
        assert_eq!(m[3].content, "question 1");
        assert_eq!(m[6].content, "answer 2");
        assert_eq!(m[7].content, "next?");
        assert_eq!(m[7].role, Role::User);
        assert_eq!(prompt.window_messages, 4);
    }

    #[test]
    fn facts_segment_respects_prompt_facts() {
        let window = RecencyWindow::default();
        let summary = SessionSummary::new();
        let mut facts = FactStore::new();
        facts.upsert(vec![
            FactCandidate::new("a", "1"),
            FactCandidate::new("b", "2"),
            FactCandidate::new("c", "3"),
        ]);
        let input = AssemblyInput {
            prefix: &[],
            window: &window,
            summary: &summary,
            facts: &facts,
        };
        let opts = BuildOptions {
            prompt_facts: 1,
            ..BuildOptions::default()
        };

        let prompt = heuristic().build_prompt(&input, &Message::user("hi"), &opts);
        assert_eq!(prompt.messages[0].content, "[Known Facts]\n- a: 1");
    }

    #[test]
    fn shrinks_by_whole_turns() {
        let window = three_turn_window();
        let summary = SessionSummary::new();
        let facts = FactStore::new();
        let prefix = vec![Message::system("p")];
        let input = AssemblyInput {
            prefix: &prefix,
            window: &window,
            summary: &summary,
            facts: &facts,
        };
        let counter = Arc::new(RecordingCounter::default());
        let asm = PromptAssembler::new(counter.clone());

        // prefix + 4 window + user = 6 > 4; after one shrink: 1 + 2 + 1 = 4.
        let prompt = asm.build_prompt(&input, &Message::user("u"), &options(4, 4));

        assert_eq!(*counter.lengths.lock().unwrap(), vec![6, 4]);
        assert_eq!(prompt.stage, DegradationStage::TurnShrink);
        assert_eq!(prompt.window_messages, 2);
        assert_eq!(prompt.messages[1].content, "question 2");
        assert_eq!(prompt.approx_tokens, 4);
    }

    #[test]
    fn drives_k_to_zero_before_fallback() {
        let window = three_turn_window();
        let summary = SessionSummary::new();
        let facts = FactStore::new();
        let prefix = vec![Message::system("p")];
        let input = AssemblyInput {
            prefix: &prefix,
            window: &window,
            summary: &summary,
            facts: &facts,
        };
        let counter = Arc::new(RecordingCounter::default());
        let asm = PromptAssembler::new(counter.clone());

        let prompt = asm.build_prompt(&input, &Message::user("u"), &options(0, 4));

        // k = 4, 2, 0, then the nudge replaces the window.
        assert_eq!(*counter.lengths.lock().unwrap(), vec![6, 4, 2, 3]);
        assert_eq!(prompt.stage, DegradationStage::Fallback);
        assert_eq!(prompt.window_messages, 0);
        assert_eq!(prompt.messages[1].content, FALLBACK_NUDGE);
        assert_eq!(prompt.approx_tokens, 3);
        assert!(prompt.over_budget());
    }

    #[test]
    fn tiny_budget_reaches_fallback_without_panicking() {
        let prefix = vec![Message::system(
            "You are a meticulous assistant. Follow the house style at all times.",
        )];
        let window = three_turn_window();
        let mut summary = SessionSummary::new();
        summary.set("The user is refactoring a parser.");
        let facts = FactStore::new();
        let input = AssemblyInput {
            prefix: &prefix,
            window: &window,
            summary: &summary,
            facts: &facts,
        };
        let user = Message::user("What next?");

        let prompt = heuristic().build_prompt(&input, &user, &options(1, 4));

        assert_eq!(prompt.stage, DegradationStage::Fallback);
        assert!(prompt.messages.iter().all(|m| m.role != Role::Assistant));
        assert_eq!(prompt.messages.len(), 4);
        assert_eq!(prompt.messages[2].content, FALLBACK_NUDGE);
        assert_eq!(prompt.messages.last(), Some(&user));
        assert_eq!(prompt.approx_tokens, HeuristicCounter.count(&prompt.messages));
        assert!(prompt.over_budget());
    }

    #[test]
    fn user_message_is_never_shortened() {
        let long = "x".repeat(10_000);
        let window = RecencyWindow::default();
        let summary = SessionSummary::new();
        let facts = FactStore::new();
        let input = AssemblyInput {
            prefix: &[],
            window: &window,
            summary: &summary,
            facts: &facts,
        };

        let prompt = heuristic().build_prompt(&input, &Message::user(long.clone()), &options(10, 4));
        assert_eq!(prompt.messages.last().unwrap().content, long);
    }

    #[test]
    fn odd_keep_turns_saturates_at_zero() {
        let window = three_turn_window();
        let summary = SessionSummary::new();
        let facts = FactStore::new();
        let input = AssemblyInput {
            prefix: &[],
            window: &window,
            summary: &summary,
            facts: &facts,
        };
        let counter = Arc::new(RecordingCounter::default());
        let asm = PromptAssembler::new(counter.clone());

        asm.build_prompt(&input, &Message::user("u"), &options(0, 3));
        // k = 3, 1, 0, then fallback (nudge + user).
        assert_eq!(*counter.lengths.lock().unwrap(), vec![4, 2, 1, 2]);
    }

    #[test]
    fn assembly_does_not_alias_state() {
        let window = three_turn_window();
        let summary = SessionSummary::new();
        let facts = FactStore::new();
        let input = AssemblyInput {
            prefix: &[],
            window: &window,
            summary: &summary,
            facts: &facts,
        };

        let mut prompt = heuristic().build_prompt(&input, &Message::user("u"), &BuildOptions::default());
        prompt.messages.clear();
        assert_eq!(window.len(), 6);
    }
}
