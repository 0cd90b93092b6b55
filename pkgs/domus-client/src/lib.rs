//! Domus Client - data model and service seam for the Domus portal
//!
//! This crate defines the canonical types the portal core works with
//! (inquiries, messages, attachments, units), the raw payload shapes the
//! inquiry backend returns, and the [`InquiryService`] trait the
//! reconciliation layer consumes.
//!
//! # Payload shapes
//!
//! The backend exposes two inquiry payload shapes and both must be tolerated
//! indefinitely (old records are never migrated in place):
//!
//! - **Structured**: `{ "messages": [ ... ] }`, an ordered array of message
//!   entries with sender and timestamp metadata.
//! - **Legacy**: `{ "message": "..." }`, a single free-text blob whose only
//!   structure is an embedded `--- New Message [<unix-ms>] ---` marker.
//!
//! [`InquiryPayload`] models the distinction; turning either shape into a
//! canonical message list is the job of the `domus-inquiry` crate.

mod error;
mod models;
mod service;

pub use error::ClientError;
pub use models::{
    display_time, Attachment, AttachmentUpload, Inquiry, InquiryPayload, InquiryStatus, Message,
    RawMessage, Sender, Unit,
};
pub use service::InquiryService;
