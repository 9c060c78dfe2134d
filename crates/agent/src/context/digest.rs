//! Tool digests: length-capped stand-ins for raw tool output.

use contextclaw_core::message::Message;

/// Default character cap for a digest body.
pub const DEFAULT_DIGEST_MAX_CHARS: usize = 800;

/// Appended to a body that was cut at the cap.
pub const TRUNCATION_MARKER: &str = " ...[truncated]";

/// Turn raw tool output into a `tool` message:
///
/// ```text
/// TOOL=<name>
/// SUMMARY:
/// <first max_chars characters of raw>[ ...[truncated]]
/// ```
///
/// Lengths are measured in characters, so multi-byte text is never split.
pub fn digest(name: &str, raw: &str, max_chars: usize) -> Message {
    let body = match raw.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &raw[..cut], TRUNCATION_MARKER),
        None => raw.to_string(),
    };
    Message::tool(format!("TOOL={name}\nSUMMARY:\n{body}"))
}
