//! Session — the per-conversation handle that owns all context state.
//!
//! A [`Session`] bundles the static prefix, recency window, fact store,
//! summary, and assembler for one conversation. Nothing lives in process
//! globals, so independent sessions never collide.
//!
//! Turn recording and compaction take `&mut self`, which serializes them
//! against prompt assembly: a prompt can never observe a half-applied
//! compaction. Agent loops that share a session across tasks wrap it in a
//! `tokio::sync::Mutex`.

use crate::context::assembler::{AssembledPrompt, AssemblyInput, BuildOptions, PromptAssembler};
use crate::context::digest::digest;
use crate::context::summary::SessionSummary;
use crate::context::token::HeuristicCounter;
use crate::context::window::RecencyWindow;
use contextclaw_config::ContextConfig;
use contextclaw_core::compaction::{FactExtractor, Summarizer};
use contextclaw_core::error::Result;
use contextclaw_core::fact::{FactCandidate, FactExtraction, parse_fact_candidates};
use contextclaw_core::message::{Message, SessionId};
use contextclaw_core::token::TokenCounter;
use contextclaw_memory::FactStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What one [`Session::compact`] call changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompactionReport {
    /// Messages handed to the collaborators.
    pub turns_compacted: usize,
    pub summary_updated: bool,
    pub facts_upserted: usize,
    pub facts_evicted: usize,
    /// The extractor's output could not be parsed and was discarded.
    pub malformed_extraction: bool,
}

/// All context state for one conversation.
pub struct Session {
    id: SessionId,
    config: ContextConfig,
    prefix: Vec<Message>,
    window: RecencyWindow,
    facts: FactStore,
    summary: SessionSummary,
    assembler: PromptAssembler,
    /// Messages appended since the last successful compaction.
    uncompacted: usize,
}

impl Session {
    pub fn new(config: ContextConfig, prefix: Vec<Message>, counter: Arc<dyn TokenCounter>) -> Self {
        Self {
            id: SessionId::new(),
            window: RecencyWindow::new(config.window_capacity),
            config,
            prefix,
            facts: FactStore::new(),
            summary: SessionSummary::new(),
            assembler: PromptAssembler::new(counter),
            uncompacted: 0,
        }
    }

    /// A session that budgets with the 4-chars-per-token heuristic.
    pub fn with_heuristic_counter(config: ContextConfig, prefix: Vec<Message>) -> Self {
        Self::new(config, prefix, Arc::new(HeuristicCounter))
    }

    pub fn with_id(mut self, id: SessionId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn prefix(&self) -> &[Message] {
        &self.prefix
    }

    pub fn window(&self) -> &RecencyWindow {
        &self.window
    }

    pub fn facts(&self) -> &FactStore {
        &self.facts
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    // ── Prompt assembly ──

    /// Build a prompt with the configured budget and window slice.
    pub fn build_prompt(&self, user: &Message) -> AssembledPrompt {
        self.build_prompt_with(user, self.config.max_input_tokens, self.config.keep_turns)
    }

    /// Build a prompt with an explicit budget and starting window slice.
    pub fn build_prompt_with(
        &self,
        user: &Message,
        max_input_tokens: usize,
        keep_turns: usize,
    ) -> AssembledPrompt {
        let input = AssemblyInput {
            prefix: &self.prefix,
            window: &self.window,
            summary: &self.summary,
            facts: &self.facts,
        };
        let options = BuildOptions {
            max_input_tokens,
            keep_turns,
            prompt_facts: self.config.prompt_facts,
        };
        let prompt = self.assembler.build_prompt(&input, user, &options);
        debug!(
            session = %self.id,
            tokens = prompt.approx_tokens,
            budget = prompt.budget,
            stage = ?prompt.stage,
            "Assembled prompt"
        );
        prompt
    }

    // ── Recording ──

    /// Append raw messages to the window.
    pub fn record_messages<I>(&mut self, messages: I)
    where
        I: IntoIterator<Item = Message>,
    {
        let messages: Vec<Message> = messages.into_iter().collect();
        self.uncompacted += messages.len();
        self.window.append(messages);
    }

    /// Append one completed user/assistant exchange.
    pub fn record_exchange(&mut self, user: Message, assistant: Message) {
        self.record_messages([user, assistant]);
    }

    /// Digest raw tool output and append it to the window.
    pub fn record_tool_output(&mut self, name: &str, raw: &str) {
        let message = digest(name, raw, self.config.digest_max_chars);
        self.record_messages([message]);
    }

    /// Replace the session summary directly.
    pub fn set_summary(&mut self, text: impl Into<String>) {
        self.summary.set(text);
    }

    /// Upsert facts directly, then enforce the configured fact cap.
    pub fn upsert_facts<I>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = FactCandidate>,
    {
        let written = self.facts.upsert(candidates);
        self.facts.cleanup(self.config.max_facts);
        written
    }

    pub fn remove_fact(&mut self, key: &str) -> bool {
        self.facts.remove(key)
    }

    // ── Compaction ──

    /// Fold the messages recorded since the last compaction into the
    /// summary and fact store.
    ///
    /// Both collaborators run concurrently. If either fails, nothing is
    /// written and the same messages are offered again next time. Malformed
    /// extractor output is not a failure: it yields no facts.
    pub async fn compact(
        &mut self,
        summarizer: &dyn Summarizer,
        extractor: &dyn FactExtractor,
    ) -> Result<CompactionReport> {
        let pending = self.uncompacted.min(self.window.len());
        if pending == 0 {
            debug!(session = %self.id, "Nothing to compact");
            return Ok(CompactionReport::default());
        }
        let new_turns = self.window.slice(pending);

        let (summary, extraction) = tokio::join!(
            summarizer.summarize(self.summary.get(), &new_turns),
            extractor.extract(&new_turns),
        );
        let summary = summary?;
        let raw = extraction?;

        let extraction = parse_fact_candidates(&raw);
        let malformed_extraction = extraction.is_invalid();
        if let FactExtraction::Invalid { reason } = &extraction {
            warn!(
                session = %self.id,
                extractor = extractor.name(),
                %reason,
                "Discarding malformed fact extraction"
            );
        }

        self.summary.set(summary);
        let facts_upserted = self.facts.upsert(extraction.into_candidates());
        let facts_evicted = self.facts.cleanup(self.config.max_facts);
        self.uncompacted = 0;

        info!(
            session = %self.id,
            summarizer = summarizer.name(),
            turns = pending,
            facts_upserted,
            facts_evicted,
            "Compacted session context"
        );

        Ok(CompactionReport {
            turns_compacted: pending,
            summary_updated: true,
            facts_upserted,
            facts_evicted,
            malformed_extraction,
        })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("prefix", &self.prefix.len())
            .field("window", &self.window.len())
            .field("facts", &self.facts.len())
            .field("summary_chars", &self.summary.get().len())
            .finish()
    }
}
