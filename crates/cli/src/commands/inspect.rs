//! `contextclaw inspect` — Assemble the next prompt for a saved transcript.
//!
//! Transcript format:
//!
//! ```json
//! {
//!   "prefix": [{"role": "system", "content": "You are ..."}],
//!   "turns": [{"role": "user", "content": "..."}, {"role": "assistant", "content": "..."}],
//!   "tool_outputs": [{"name": "shell", "output": "..."}],
//!   "summary": "optional compacted narrative",
//!   "facts": [{"key": "name", "value": "Alice"}],
//!   "user": "the next user message"
//! }
//! ```

use contextclaw_agent::{AssembledPrompt, Session};
use contextclaw_config::ContextConfig;
use contextclaw_core::fact::FactCandidate;
use contextclaw_core::message::Message;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub prefix: Vec<Message>,
    #[serde(default)]
    pub turns: Vec<Message>,
    #[serde(default)]
    pub tool_outputs: Vec<ToolOutput>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub facts: Vec<FactCandidate>,
    pub user: String,
}

#[derive(Debug, Deserialize)]
pub struct ToolOutput {
    pub name: String,
    pub output: String,
}

impl Transcript {
    /// Replay the transcript into a fresh session.
    pub fn into_session(self, config: &ContextConfig) -> (Session, Message) {
        let mut session = Session::with_heuristic_counter(config.clone(), self.prefix);
        session.record_messages(self.turns);
        for tool in &self.tool_outputs {
            session.record_tool_output(&tool.name, &tool.output);
        }
        if !self.summary.is_empty() {
            session.set_summary(self.summary);
        }
        session.upsert_facts(self.facts);
        (session, Message::user(self.user))
    }
}

pub fn run(
    config: &ContextConfig,
    transcript: &Path,
    budget: Option<usize>,
    keep_turns: Option<usize>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(transcript)
        .map_err(|e| format!("Failed to read {}: {e}", transcript.display()))?;
    let parsed: Transcript = serde_json::from_str(&raw)
        .map_err(|e| format!("Invalid transcript {}: {e}", transcript.display()))?;

    let (session, user) = parsed.into_session(config);
    let prompt = session.build_prompt_with(
        &user,
        budget.unwrap_or(config.max_input_tokens),
        keep_turns.unwrap_or(config.keep_turns),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&prompt)?);
    } else {
        print_prompt(&prompt);
    }
    Ok(())
}

fn print_prompt(prompt: &AssembledPrompt) {
    for (i, message) in prompt.messages.iter().enumerate() {
        println!("── {:>2}. [{}] ──", i + 1, message.role);
        println!("{}", message.content);
    }
    println!();
    println!("📏 Tokens:  {} / {}", prompt.approx_tokens, prompt.budget);
    println!("🪟 Window:  {} message(s)", prompt.window_messages);
    println!("📉 Stage:   {:?}", prompt.stage);
    if prompt.over_budget() {
        println!("⚠️  Prompt is over budget after full degradation");
    }
}
