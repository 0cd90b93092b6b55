use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an inquiry as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    New,
    Pending,
    Active,
    Responded,
    Assigned,
    Closed,
}

/// Which party of the conversation an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Tenant,
    Manager,
}

impl Sender {
    /// The opposite side of the conversation.
    pub fn counterpart(self) -> Self {
        match self {
            Sender::Tenant => Sender::Manager,
            Sender::Manager => Sender::Tenant,
        }
    }
}

/// One entry of the structured message array, as the backend returns it.
///
/// Every field except the text is optional on the wire; the normalizer fills
/// the gaps (sender inference, timestamp defaulting) when it builds the
/// canonical [`Message`] list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub sender: Option<Sender>,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub text: String,
    /// Creation time in unix milliseconds, when the record carries one.
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// The two payload shapes an inquiry record may carry.
///
/// Older inquiries store their whole conversation as one free-text blob with
/// embedded markers; newer ones carry a structured message array. Both are
/// kept deserializable forever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InquiryPayload {
    Structured { messages: Vec<RawMessage> },
    Legacy { message: String },
}

/// A tenant-to-manager conversation thread scoped to one listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: String,
    pub listing_id: String,
    #[serde(default)]
    pub unit_id: Option<String>,
    pub tenant_id: String,
    pub manager_id: String,
    pub status: InquiryStatus,
    #[serde(flatten)]
    pub payload: InquiryPayload,
}

/// Canonical, display-ready message produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Server-issued identifier, or a `local-` prefixed temporary one for
    /// optimistic entries awaiting confirmation.
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Pre-formatted time string for rendering.
    pub display_time: String,
    /// True while the message only exists client-side.
    pub pending: bool,
}

impl Message {
    /// Millisecond timestamp used for ordering and correlation.
    pub fn created_at_ms(&self) -> i64 {
        self.created_at.timestamp_millis()
    }

    pub fn is_local(&self) -> bool {
        self.id.starts_with("local-")
    }
}

/// Render a timestamp the way the thread view displays it.
pub fn display_time(at: DateTime<Utc>) -> String {
    at.format("%b %e, %H:%M").to_string()
}

/// Attachment metadata as stored by the backend. The binary content is
/// fetched separately via [`crate::InquiryService::download_attachment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub inquiry_id: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: u64,
    pub uploaded_by: Sender,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Attachment {
    pub fn created_at_ms(&self) -> i64 {
        self.created_at.timestamp_millis()
    }
}

/// A rentable unit of a listing, cached per listing for instant redisplay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: String,
    pub label: String,
    pub available: bool,
}

/// Payload for uploading one file to an inquiry.
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub file_type: Option<String>,
    pub data: Vec<u8>,
}

impl AttachmentUpload {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            file_type: None,
            data,
        }
    }

    /// The MIME type to send: the explicit one when present, otherwise
    /// guessed from the file name.
    pub fn resolved_type(&self) -> String {
        match &self.file_type {
            Some(t) => t.clone(),
            None => mime_guess::from_path(&self.file_name)
                .first_or_octet_stream()
                .to_string(),
        }
    }
}
