//! Legacy text decoder - splits the old free-text message format
//!
//! Before the backend grew a structured message array, a whole conversation
//! was stored as one text blob with messages separated by an embedded marker:
//!
//! ```text
//! first message
//!
//! --- New Message [1700000000000] ---
//! second message
//! ```
//!
//! The bracketed unix-millisecond timestamp is optional. A marker announces
//! the message that follows it; the text before the first marker therefore
//! never receives a marker-supplied timestamp.

use chrono::Utc;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n\n--- New Message(?: \[(\d+)\])? ---\n").expect("marker pattern is valid")
});

/// One decoded message fragment of a legacy blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    /// Marker-supplied timestamp, or the decode time when the marker carried
    /// none (synthetic, so absolute time is approximate but relative order
    /// within the blob is preserved).
    pub timestamp_ms: i64,
}

/// Decode a legacy blob, stamping timestamp-less fragments with the current
/// wall clock.
pub fn decode(text: &str) -> Vec<Fragment> {
    decode_at(text, Utc::now().timestamp_millis())
}

/// Decode a legacy blob, stamping timestamp-less fragments with `now_ms`.
///
/// Never fails: input without markers degrades to a single fragment holding
/// the whole (trimmed) string, and an empty input decodes to no fragments.
pub fn decode_at(text: &str, now_ms: i64) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut cursor = 0;
    let mut pending_ts: Option<i64> = None;

    for caps in MARKER.captures_iter(text) {
        let marker = caps.get(0).expect("capture group 0 always present");
        push_fragment(&mut fragments, &text[cursor..marker.start()], pending_ts, now_ms);
        // The timestamp belongs to the fragment that follows this marker.
        pending_ts = caps.get(1).and_then(|ts| ts.as_str().parse::<i64>().ok());
        cursor = marker.end();
    }
    push_fragment(&mut fragments, &text[cursor..], pending_ts, now_ms);

    debug!("Decoded legacy blob into {} fragments", fragments.len());
    fragments
}

fn push_fragment(out: &mut Vec<Fragment>, raw: &str, ts: Option<i64>, now_ms: i64) {
    let cleaned = strip_residual_markers(raw);
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return;
    }
    out.push(Fragment {
        text: trimmed.to_string(),
        timestamp_ms: ts.unwrap_or(now_ms),
    });
}

/// Drop lines that are leftover pieces of a mangled marker (e.g. a marker
/// whose surrounding blank lines were lost in storage).
fn strip_residual_markers(raw: &str) -> String {
    if !raw.contains("--- New Message") {
        return raw.to_string();
    }
    raw.lines()
        .filter(|line| !line.trim_start().starts_with("--- New Message"))
        .collect::<Vec<_>>()
        .join("\n")
}
