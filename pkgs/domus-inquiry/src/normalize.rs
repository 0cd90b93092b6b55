//! Message normalizer - canonical message list for one inquiry record
//!
//! The structured message array wins whenever it is non-empty; otherwise the
//! record's legacy text blob is decoded. Source order is assumed
//! chronological and is never re-sorted; only the assignment of missing
//! timestamps uses decode-time ordering as a tie-break.

use crate::legacy;
use chrono::{DateTime, Utc};
use domus_client::{display_time, Inquiry, InquiryPayload, Message, RawMessage, Sender};
use tracing::debug;

/// Normalize an inquiry's payload into the canonical message list, stamping
/// timestamp-less entries with the current wall clock.
pub fn normalize(inquiry: &Inquiry) -> Vec<Message> {
    normalize_at(inquiry, Utc::now().timestamp_millis())
}

/// Normalize an inquiry's payload, stamping timestamp-less entries with
/// `now_ms`.
pub fn normalize_at(inquiry: &Inquiry, now_ms: i64) -> Vec<Message> {
    match &inquiry.payload {
        InquiryPayload::Structured { messages } if !messages.is_empty() => messages
            .iter()
            .enumerate()
            .map(|(idx, raw)| canonical_message(raw, idx, &inquiry.manager_id, now_ms))
            .collect(),
        InquiryPayload::Structured { .. } => Vec::new(),
        InquiryPayload::Legacy { message } => {
            debug!("Inquiry {} uses the legacy text payload", inquiry.id);
            // The legacy format only ever recorded the tenant's side of the
            // conversation; manager replies of that era went through a
            // different mechanism and are not part of the blob. Attributing
            // every fragment to the tenant preserves that source behavior.
            legacy::decode_at(message, now_ms)
                .into_iter()
                .enumerate()
                .map(|(idx, fragment)| {
                    let created_at = timestamp(fragment.timestamp_ms, now_ms);
                    Message {
                        id: format!("legacy-{}-{idx}", inquiry.id),
                        sender: Sender::Tenant,
                        text: fragment.text,
                        created_at,
                        display_time: display_time(created_at),
                        pending: false,
                    }
                })
                .collect()
        }
    }
}

fn canonical_message(raw: &RawMessage, idx: usize, manager_id: &str, now_ms: i64) -> Message {
    let sender = raw.sender.unwrap_or_else(|| infer_sender(raw, manager_id));
    let created_at = timestamp(raw.created_at.unwrap_or(now_ms), now_ms);
    Message {
        id: raw.id.clone().unwrap_or_else(|| format!("msg-{idx}")),
        sender,
        text: raw.text.clone(),
        created_at,
        display_time: display_time(created_at),
        pending: false,
    }
}

/// Without an explicit sender tag, compare the sender identifier against the
/// inquiry's known manager identifier.
fn infer_sender(raw: &RawMessage, manager_id: &str) -> Sender {
    match raw.sender_id.as_deref() {
        Some(id) if id == manager_id => Sender::Manager,
        _ => Sender::Tenant,
    }
}

fn timestamp(ms: i64, fallback_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms)
        .or_else(|| DateTime::from_timestamp_millis(fallback_ms))
        .unwrap_or_else(Utc::now)
}
