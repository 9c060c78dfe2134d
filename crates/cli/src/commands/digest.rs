//! `contextclaw digest` — Reduce a tool output file to its window message.

use contextclaw_config::ContextConfig;
use std::path::Path;

pub fn run(
    config: &ContextConfig,
    name: &str,
    file: &Path,
    max_chars: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
    let max_chars = max_chars.unwrap_or(config.digest_max_chars);

    let message = contextclaw_agent::digest(name, &raw, max_chars);
    tracing::debug!(
        raw_chars = raw.chars().count(),
        digest_chars = message.content.chars().count(),
        "Digested tool output"
    );

    println!("[{}]", message.role);
    println!("{}", message.content);
    Ok(())
}
