//! Thread store - reconciled per-inquiry state behind the open views
//!
//! The store is the single place the rendered view reads from. Local sends
//! append optimistically and are later replaced by their authoritative server
//! versions through [`ThreadStore::reconcile`], which rebuilds a thread
//! wholesale from freshly normalized and correlated server data. The last
//! reconcile to land governs the displayed state of that inquiry.

use crate::correlate::{correlate, CorrelatedThread, CorrelatorConfig, ThreadEntry};
use crate::normalize;
use chrono::Utc;
use domus_client::{display_time, Attachment, Inquiry, Message, Sender};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use uuid::Uuid;

/// Reconciled state of one inquiry thread. Created when the inquiry is first
/// opened, refreshed in place on every reconcile, discarded with the view.
#[derive(Debug, Clone)]
pub struct ThreadState {
    /// Latest server record (status, parties, listing reference).
    pub inquiry: Inquiry,
    /// Canonical message list: server-confirmed entries in source order,
    /// followed by retained optimistic entries.
    pub messages: Vec<Message>,
    pub attachments: Vec<Attachment>,
    /// Display timeline with attachments claimed or standalone.
    pub entries: Vec<ThreadEntry>,
    /// Attachment identifiers claimed by some message (derived).
    pub claimed: HashSet<String>,
    /// Counterpart messages that arrived while the thread was not selected.
    pub unread: u32,
    /// Text of the newest timeline entry, for the inquiry list.
    pub last_preview: Option<String>,
}

impl ThreadState {
    fn recompute(&mut self, config: &CorrelatorConfig) {
        let CorrelatedThread { entries, claimed } =
            correlate(&self.messages, &self.attachments, config);
        self.last_preview = last_preview(&entries);
        self.entries = entries;
        self.claimed = claimed;
    }
}

/// Per-inquiry reconciled state plus the selection the view renders.
pub struct ThreadStore {
    config: CorrelatorConfig,
    /// Which side of the conversation this client renders for; messages from
    /// the other side count as unread.
    viewer: Sender,
    threads: HashMap<String, ThreadState>,
    /// Inquiry identifiers in list order (dedup order of the last reload).
    order: Vec<String>,
    selected: Option<String>,
}

impl ThreadStore {
    pub fn new(config: CorrelatorConfig, viewer: Sender) -> Self {
        Self {
            config,
            viewer,
            threads: HashMap::new(),
            order: Vec::new(),
            selected: None,
        }
    }

    /// Optimistically append a local message to an open thread.
    ///
    /// The message gets a temporary `local-` identifier and the current time,
    /// is visible immediately, and always lands at the end of the list (it
    /// represents "now"). Returns `None` when the thread was never opened.
    pub fn append_local(&mut self, inquiry_id: &str, sender: Sender, text: &str) -> Option<Message> {
        let state = self.threads.get_mut(inquiry_id)?;
        let created_at = Utc::now();
        let message = Message {
            id: format!("local-{}", Uuid::new_v4()),
            sender,
            text: text.to_string(),
            created_at,
            display_time: display_time(created_at),
            pending: true,
        };
        debug!("Appending optimistic message {} to {}", message.id, inquiry_id);
        state.messages.push(message.clone());
        state.recompute(&self.config);
        Some(message)
    }

    /// Replace a thread's state wholesale with freshly normalized and
    /// correlated server data.
    ///
    /// Optimistic local entries are retained until a server message
    /// represents them (same sender, identical text, stored at or after the
    /// optimistic append); everything else is authoritative server state.
    /// Idempotent: reconciling the same payload twice yields identical state.
    pub fn reconcile(&mut self, inquiry: Inquiry, attachments: Vec<Attachment>) {
        self.reconcile_at(inquiry, attachments, Utc::now().timestamp_millis());
    }

    /// [`ThreadStore::reconcile`] with an explicit decode clock.
    pub fn reconcile_at(&mut self, inquiry: Inquiry, attachments: Vec<Attachment>, now_ms: i64) {
        let inquiry_id = inquiry.id.clone();
        let server_messages = normalize::normalize_at(&inquiry, now_ms);

        let previous = self.threads.get(&inquiry_id);
        let retained: Vec<Message> = previous
            .map(|state| {
                state
                    .messages
                    .iter()
                    .filter(|m| m.pending && !is_represented(m, &server_messages))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        // Unread counts new counterpart messages only; the initial load is
        // history, not news.
        let unread = match previous {
            None => 0,
            Some(_) if self.selected.as_deref() == Some(inquiry_id.as_str()) => 0,
            Some(state) => {
                let known: HashSet<&str> =
                    state.messages.iter().map(|m| m.id.as_str()).collect();
                let fresh = server_messages
                    .iter()
                    .filter(|m| m.sender != self.viewer && !known.contains(m.id.as_str()))
                    .count() as u32;
                state.unread + fresh
            }
        };

        let mut messages = server_messages;
        messages.extend(retained);

        let mut state = ThreadState {
            inquiry,
            messages,
            attachments,
            entries: Vec::new(),
            claimed: HashSet::new(),
            unread,
            last_preview: None,
        };
        state.recompute(&self.config);

        if !self.threads.contains_key(&inquiry_id) {
            self.order.push(inquiry_id.clone());
        }
        debug!(
            "Reconciled inquiry {} ({} messages, {} attachments)",
            inquiry_id,
            state.messages.len(),
            state.attachments.len()
        );
        self.threads.insert(inquiry_id, state);
    }

    /// Re-establish the open inquiry after a reconcile.
    ///
    /// A reconcile may resolve after the user has switched to a different
    /// inquiry; in that case the current selection is left alone. When the
    /// reconciled inquiry *is* the selected one, the selection survives if
    /// the thread still exists and is cleared otherwise.
    pub fn select_after_reconcile(&mut self, inquiry_id: &str) {
        if self.selected.as_deref() != Some(inquiry_id) {
            return;
        }
        if !self.threads.contains_key(inquiry_id) {
            warn!("Selected inquiry {} vanished after reconcile", inquiry_id);
            self.selected = None;
        }
    }

    pub fn select(&mut self, inquiry_id: &str) {
        self.selected = Some(inquiry_id.to_string());
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Reset a thread's unread counter (the user is looking at it).
    pub fn mark_read(&mut self, inquiry_id: &str) {
        if let Some(state) = self.threads.get_mut(inquiry_id) {
            state.unread = 0;
        }
    }

    pub fn get(&self, inquiry_id: &str) -> Option<&ThreadState> {
        self.threads.get(inquiry_id)
    }

    pub fn selected_state(&self) -> Option<&ThreadState> {
        self.selected.as_deref().and_then(|id| self.threads.get(id))
    }

    /// Threads in list order.
    pub fn iter_in_order(&self) -> impl Iterator<Item = &ThreadState> {
        self.order.iter().filter_map(|id| self.threads.get(id))
    }

    /// Drop threads whose inquiries disappeared from the last full reload,
    /// clearing the selection if it pointed at one of them.
    pub fn retain(&mut self, inquiry_ids: &[String]) {
        let keep: HashSet<&str> = inquiry_ids.iter().map(String::as_str).collect();
        self.order.retain(|id| keep.contains(id.as_str()));
        self.threads.retain(|id, _| keep.contains(id.as_str()));
        if let Some(selected) = self.selected.as_deref() {
            if !self.threads.contains_key(selected) {
                self.selected = None;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Discard all thread state (view closed).
    pub fn clear(&mut self) {
        self.threads.clear();
        self.order.clear();
        self.selected = None;
    }
}

/// A server message represents an optimistic local one when sender and text
/// match and the server stored it no earlier than the local append. The send
/// endpoint only acknowledges, so content is the only possible join key.
fn is_represented(local: &Message, server_messages: &[Message]) -> bool {
    server_messages.iter().any(|m| {
        m.sender == local.sender && m.text == local.text && m.created_at >= local.created_at
    })
}

fn last_preview(entries: &[ThreadEntry]) -> Option<String> {
    entries.last().map(|entry| match entry {
        ThreadEntry::Message { message, .. } if !message.text.is_empty() => message.text.clone(),
        ThreadEntry::Message { attachments, .. } => attachments
            .last()
            .map(|att| att.file_name.clone())
            .unwrap_or_default(),
        ThreadEntry::Attachment(att) => att.file_name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use domus_client::{InquiryPayload, InquiryStatus, RawMessage};

    // Far enough in the future that wall-clock stamps from append_local sort
    // before it.
    const NOW: i64 = 4_000_000_000_000;

    fn raw(id: &str, sender: Sender, text: &str, at_ms: i64) -> RawMessage {
        RawMessage {
            id: Some(id.to_string()),
            sender: Some(sender),
            sender_id: None,
            text: text.to_string(),
            created_at: Some(at_ms),
        }
    }

    fn inquiry(id: &str, messages: Vec<RawMessage>) -> Inquiry {
        Inquiry {
            id: id.to_string(),
            listing_id: "listing-5".to_string(),
            unit_id: None,
            tenant_id: "tenant-1".to_string(),
            manager_id: "manager-1".to_string(),
            status: InquiryStatus::Active,
            payload: InquiryPayload::Structured { messages },
        }
    }

    fn attachment(id: &str, at_ms: i64) -> Attachment {
        Attachment {
            id: id.to_string(),
            inquiry_id: "inq-1".to_string(),
            file_name: format!("{id}.pdf"),
            file_type: "application/pdf".to_string(),
            file_size: 99,
            uploaded_by: Sender::Tenant,
            created_at: DateTime::from_timestamp_millis(at_ms).unwrap(),
        }
    }

    fn store() -> ThreadStore {
        ThreadStore::new(CorrelatorConfig::default(), Sender::Manager)
    }

    #[test]
    fn reconcile_twice_with_same_payload_is_identical() {
        let mut store = store();
        let record = inquiry(
            "inq-1",
            vec![raw("m1", Sender::Tenant, "Hi", 1_000)],
        );
        let attachments = vec![attachment("a1", 500)];

        store.reconcile_at(record.clone(), attachments.clone(), NOW);
        let first = store.get("inq-1").unwrap().clone();
        store.reconcile_at(record, attachments, NOW);
        let second = store.get("inq-1").unwrap();

        assert_eq!(first.messages, second.messages);
        assert_eq!(first.attachments, second.attachments);
        assert_eq!(first.entries, second.entries);
        assert_eq!(first.claimed, second.claimed);
        assert_eq!(first.unread, second.unread);
        assert_eq!(first.last_preview, second.last_preview);
    }

    #[test]
    fn optimistic_append_is_visible_at_the_end() {
        let mut store = store();
        store.reconcile_at(
            inquiry("inq-1", vec![raw("m1", Sender::Tenant, "Hi", 1_000)]),
            vec![],
            NOW,
        );

        let local = store
            .append_local("inq-1", Sender::Manager, "On it")
            .unwrap();
        assert!(local.pending);
        assert!(local.id.starts_with("local-"));

        let state = store.get("inq-1").unwrap();
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages.last().unwrap().id, local.id);
        assert_eq!(state.last_preview.as_deref(), Some("On it"));
    }

    #[test]
    fn append_to_unopened_thread_returns_none() {
        let mut store = store();
        assert!(store.append_local("nope", Sender::Manager, "hi").is_none());
    }

    #[test]
    fn optimistic_entry_survives_reconcile_that_lacks_it() {
        let mut store = store();
        let record = inquiry("inq-1", vec![raw("m1", Sender::Tenant, "Hi", 1_000)]);
        store.reconcile_at(record.clone(), vec![], NOW);
        let local = store
            .append_local("inq-1", Sender::Manager, "Reply")
            .unwrap();

        // Server has not stored the reply yet.
        store.reconcile_at(record, vec![], NOW);
        let state = store.get("inq-1").unwrap();
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages.last().unwrap().id, local.id);
        assert!(state.messages.last().unwrap().pending);
    }

    #[test]
    fn optimistic_entry_is_replaced_once_the_server_has_it() {
        let mut store = store();
        let record = inquiry("inq-1", vec![raw("m1", Sender::Tenant, "Hi", 1_000)]);
        store.reconcile_at(record, vec![], NOW);
        store
            .append_local("inq-1", Sender::Manager, "Reply")
            .unwrap();

        let confirmed = inquiry(
            "inq-1",
            vec![
                raw("m1", Sender::Tenant, "Hi", 1_000),
                raw("m2", Sender::Manager, "Reply", NOW + 10),
            ],
        );
        store.reconcile_at(confirmed, vec![], NOW);

        let state = store.get("inq-1").unwrap();
        assert_eq!(state.messages.len(), 2);
        assert!(state.messages.iter().all(|m| !m.pending));
        assert_eq!(state.messages.last().unwrap().id, "m2");
    }

    #[test]
    fn stale_reconcile_does_not_steal_selection() {
        let mut store = store();
        store.reconcile_at(inquiry("inq-a", vec![]), vec![], NOW);
        store.reconcile_at(inquiry("inq-b", vec![]), vec![], NOW);

        // User switched to B while A's reload was in flight.
        store.select("inq-b");
        store.select_after_reconcile("inq-a");
        assert_eq!(store.selected(), Some("inq-b"));
    }

    #[test]
    fn selection_survives_reconcile_when_the_thread_still_exists() {
        let mut store = store();
        store.reconcile_at(inquiry("inq-a", vec![]), vec![], NOW);
        store.select("inq-a");
        store.select_after_reconcile("inq-a");
        assert_eq!(store.selected(), Some("inq-a"));
        assert_eq!(store.selected_state().unwrap().inquiry.id, "inq-a");
    }

    #[test]
    fn selection_clears_when_the_thread_vanished() {
        let mut store = store();
        store.reconcile_at(inquiry("inq-a", vec![]), vec![], NOW);
        store.select("inq-a");
        store.retain(&[]);
        assert_eq!(store.selected(), None);
        store.select("inq-gone");
        store.select_after_reconcile("inq-gone");
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn unread_counts_new_counterpart_messages_only() {
        let mut store = store();
        let first = inquiry("inq-1", vec![raw("m1", Sender::Tenant, "Hi", 1_000)]);
        store.reconcile_at(first, vec![], NOW);
        // Initial load is history.
        assert_eq!(store.get("inq-1").unwrap().unread, 0);

        let second = inquiry(
            "inq-1",
            vec![
                raw("m1", Sender::Tenant, "Hi", 1_000),
                raw("m2", Sender::Tenant, "Anyone there?", 2_000),
                raw("m3", Sender::Manager, "Yes", 3_000),
            ],
        );
        store.reconcile_at(second.clone(), vec![], NOW);
        // One new tenant message; the manager's own reply does not count.
        assert_eq!(store.get("inq-1").unwrap().unread, 1);

        store.reconcile_at(second, vec![], NOW);
        assert_eq!(store.get("inq-1").unwrap().unread, 1);

        store.mark_read("inq-1");
        assert_eq!(store.get("inq-1").unwrap().unread, 0);
    }

    #[test]
    fn unread_stays_zero_for_the_selected_thread() {
        let mut store = store();
        let first = inquiry("inq-1", vec![raw("m1", Sender::Tenant, "Hi", 1_000)]);
        store.reconcile_at(first, vec![], NOW);
        store.select("inq-1");

        let second = inquiry(
            "inq-1",
            vec![
                raw("m1", Sender::Tenant, "Hi", 1_000),
                raw("m2", Sender::Tenant, "More", 2_000),
            ],
        );
        store.reconcile_at(second, vec![], NOW);
        assert_eq!(store.get("inq-1").unwrap().unread, 0);
    }

    #[test]
    fn list_order_follows_first_reconcile() {
        let mut store = store();
        store.reconcile_at(inquiry("inq-b", vec![]), vec![], NOW);
        store.reconcile_at(inquiry("inq-a", vec![]), vec![], NOW);
        store.reconcile_at(inquiry("inq-b", vec![]), vec![], NOW);

        let ids: Vec<&str> = store.iter_in_order().map(|s| s.inquiry.id.as_str()).collect();
        assert_eq!(ids, vec!["inq-b", "inq-a"]);
    }
}
