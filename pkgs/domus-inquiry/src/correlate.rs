//! Attachment correlator - pairs uploaded files with the messages they
//! accompany
//!
//! The backend records no explicit message-attachment link, so the pairing is
//! reconstructed from wall-clock proximity: a message sent at, or shortly
//! after, an attachment's upload time is presumed to be its caption.

use domus_client::{Attachment, Message};
use std::collections::HashSet;
use tracing::debug;

/// Correlation tuning. The window is a heuristic with no documented
/// justification in the original system, hence a parameter rather than a
/// constant.
#[derive(Debug, Clone)]
pub struct CorrelatorConfig {
    /// Width of the half-open match window `[0, window_ms)` between an
    /// attachment's upload time and a subsequent message's send time.
    pub window_ms: i64,
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        Self { window_ms: 2_000 }
    }
}

/// One renderable row of a reconstructed thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ThreadEntry {
    /// A message plus the attachments it claimed.
    Message {
        message: Message,
        attachments: Vec<Attachment>,
    },
    /// An attachment no message claimed, shown standalone.
    Attachment(Attachment),
}

impl ThreadEntry {
    pub fn created_at_ms(&self) -> i64 {
        match self {
            ThreadEntry::Message { message, .. } => message.created_at_ms(),
            ThreadEntry::Attachment(att) => att.created_at_ms(),
        }
    }
}

/// A message list with every attachment either claimed or standalone.
#[derive(Debug, Clone, Default)]
pub struct CorrelatedThread {
    /// Messages in source order, interleaved with unmatched attachments by
    /// their own creation time.
    pub entries: Vec<ThreadEntry>,
    /// Identifiers of attachments claimed by some message (derived, never
    /// persisted).
    pub claimed: HashSet<String>,
}

/// Assign each attachment to the message accompanying it, or leave it
/// unmatched for standalone display.
///
/// An attachment matches a message iff
/// `0 <= message.created_at - attachment.created_at < window_ms`; among
/// multiple qualifying messages the one with the smallest gap wins. With no
/// messages at all, every attachment is unmatched by definition.
pub fn correlate(
    messages: &[Message],
    attachments: &[Attachment],
    config: &CorrelatorConfig,
) -> CorrelatedThread {
    let mut claimed_per_message: Vec<Vec<Attachment>> = vec![Vec::new(); messages.len()];
    let mut claimed = HashSet::new();
    let mut unmatched: Vec<Attachment> = Vec::new();

    for attachment in attachments {
        match best_match(messages, attachment, config.window_ms) {
            Some(idx) => {
                claimed.insert(attachment.id.clone());
                claimed_per_message[idx].push(attachment.clone());
            }
            None => unmatched.push(attachment.clone()),
        }
    }

    debug!(
        "Correlated {} of {} attachments onto {} messages",
        claimed.len(),
        attachments.len(),
        messages.len()
    );

    // Standalone attachments interleave by their own creation time; messages
    // keep source order.
    unmatched.sort_by_key(Attachment::created_at_ms);
    let mut entries = Vec::with_capacity(messages.len() + unmatched.len());
    let mut pending = unmatched.into_iter().peekable();
    for (message, attachments) in messages.iter().zip(claimed_per_message) {
        while pending
            .peek()
            .is_some_and(|att| att.created_at_ms() < message.created_at_ms())
        {
            entries.push(ThreadEntry::Attachment(pending.next().expect("peeked")));
        }
        entries.push(ThreadEntry::Message {
            message: message.clone(),
            attachments,
        });
    }
    entries.extend(pending.map(ThreadEntry::Attachment));

    CorrelatedThread { entries, claimed }
}

/// The qualifying message with the smallest positive gap, if any. Ties (equal
/// timestamps) go to the earlier list position.
fn best_match(messages: &[Message], attachment: &Attachment, window_ms: i64) -> Option<usize> {
    let mut best: Option<(i64, usize)> = None;
    for (idx, message) in messages.iter().enumerate() {
        let gap = message.created_at_ms() - attachment.created_at_ms();
        if gap < 0 || gap >= window_ms {
            continue;
        }
        if best.map_or(true, |(best_gap, _)| gap < best_gap) {
            best = Some((gap, idx));
        }
    }
    best.map(|(_, idx)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use domus_client::{display_time, Sender};

    fn message(id: &str, at_ms: i64) -> Message {
        let created_at = DateTime::from_timestamp_millis(at_ms).unwrap();
        Message {
            id: id.to_string(),
            sender: Sender::Tenant,
            text: format!("text of {id}"),
            created_at,
            display_time: display_time(created_at),
            pending: false,
        }
    }

    fn attachment(id: &str, at_ms: i64) -> Attachment {
        Attachment {
            id: id.to_string(),
            inquiry_id: "inq-1".to_string(),
            file_name: format!("{id}.png"),
            file_type: "image/png".to_string(),
            file_size: 10,
            uploaded_by: Sender::Tenant,
            created_at: DateTime::from_timestamp_millis(at_ms).unwrap(),
        }
    }

    fn claimed_by<'a>(thread: &'a CorrelatedThread, message_id: &str) -> &'a [Attachment] {
        thread
            .entries
            .iter()
            .find_map(|entry| match entry {
                ThreadEntry::Message {
                    message,
                    attachments,
                } if message.id == message_id => Some(attachments.as_slice()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn attachment_inside_window_is_claimed() {
        let messages = vec![message("m1", 10_000)];
        let attachments = vec![attachment("a1", 8_001)]; // gap 1999
        let thread = correlate(&messages, &attachments, &CorrelatorConfig::default());

        assert!(thread.claimed.contains("a1"));
        assert_eq!(claimed_by(&thread, "m1").len(), 1);
    }

    #[test]
    fn window_is_half_open_at_the_boundary() {
        let messages = vec![message("m1", 10_000)];
        let attachments = vec![attachment("a1", 8_000)]; // gap == 2000: out
        let thread = correlate(&messages, &attachments, &CorrelatorConfig::default());

        assert!(thread.claimed.is_empty());
        assert!(thread
            .entries
            .iter()
            .any(|e| matches!(e, ThreadEntry::Attachment(att) if att.id == "a1")));
    }

    #[test]
    fn message_before_attachment_never_matches() {
        let messages = vec![message("m1", 7_999)]; // negative gap
        let attachments = vec![attachment("a1", 8_000)];
        let thread = correlate(&messages, &attachments, &CorrelatorConfig::default());
        assert!(thread.claimed.is_empty());
    }

    #[test]
    fn earliest_qualifying_message_wins() {
        let messages = vec![message("m1", 10_100), message("m2", 10_500)];
        let attachments = vec![attachment("a1", 10_000)];
        let thread = correlate(&messages, &attachments, &CorrelatorConfig::default());

        assert_eq!(claimed_by(&thread, "m1").len(), 1);
        assert!(claimed_by(&thread, "m2").is_empty());
    }

    #[test]
    fn no_messages_means_everything_standalone() {
        let attachments = vec![attachment("a2", 2_000), attachment("a1", 1_000)];
        let thread = correlate(&[], &attachments, &CorrelatorConfig::default());

        assert!(thread.claimed.is_empty());
        let ids: Vec<_> = thread
            .entries
            .iter()
            .map(|e| match e {
                ThreadEntry::Attachment(att) => att.id.as_str(),
                ThreadEntry::Message { .. } => panic!("no messages expected"),
            })
            .collect();
        assert_eq!(ids, vec!["a1", "a2"]);
    }

    #[test]
    fn unmatched_attachments_interleave_by_creation_time() {
        let messages = vec![message("m1", 5_000), message("m2", 60_000)];
        let attachments = vec![attachment("a-late", 90_000), attachment("a-mid", 30_000)];
        let thread = correlate(&messages, &attachments, &CorrelatorConfig::default());

        let order: Vec<String> = thread
            .entries
            .iter()
            .map(|e| match e {
                ThreadEntry::Message { message, .. } => message.id.clone(),
                ThreadEntry::Attachment(att) => att.id.clone(),
            })
            .collect();
        assert_eq!(order, vec!["m1", "a-mid", "m2", "a-late"]);
    }

    #[test]
    fn window_width_is_tunable() {
        let messages = vec![message("m1", 10_000)];
        let attachments = vec![attachment("a1", 4_000)]; // gap 6000
        let wide = CorrelatorConfig { window_ms: 10_000 };
        let thread = correlate(&messages, &attachments, &wide);
        assert!(thread.claimed.contains("a1"));
    }
}
