use crate::error::ClientError;
use crate::models::{Attachment, AttachmentUpload, Inquiry, Unit};
use async_trait::async_trait;

/// Interface to the remote inquiry service.
///
/// The portal core consumes whatever shape the backend returns and owns no
/// wire format of its own; implementations translate their transport into
/// these calls. Note that `send_message` only acknowledges - the caller must
/// re-fetch and reconcile to obtain the authoritative stored entry.
#[async_trait]
pub trait InquiryService: Send + Sync {
    /// Fetch all inquiry records visible to the current manager.
    async fn fetch_inquiries(&self) -> Result<Vec<Inquiry>, ClientError>;

    /// Fetch a single inquiry record.
    async fn fetch_inquiry(&self, inquiry_id: &str) -> Result<Inquiry, ClientError>;

    /// Append a message to an inquiry. Returns an acknowledgement only.
    async fn send_message(&self, inquiry_id: &str, text: &str) -> Result<(), ClientError>;

    /// Fetch attachment metadata for an inquiry (no content).
    async fn fetch_attachments(&self, inquiry_id: &str) -> Result<Vec<Attachment>, ClientError>;

    /// Upload files to an inquiry, returning the created metadata.
    async fn upload_attachments(
        &self,
        inquiry_id: &str,
        uploads: Vec<AttachmentUpload>,
    ) -> Result<Vec<Attachment>, ClientError>;

    /// Download one attachment's binary content.
    async fn download_attachment(&self, attachment_id: &str) -> Result<Vec<u8>, ClientError>;

    /// Fetch the rentable units of a listing.
    async fn fetch_units(&self, listing_id: &str) -> Result<Vec<Unit>, ClientError>;

    /// Assign the inquiring tenant to a listing (and optionally a unit).
    /// On success the inquiry's status becomes `assigned` at the next fetch.
    async fn assign_tenant(
        &self,
        inquiry_id: &str,
        listing_id: &str,
        unit_id: Option<&str>,
    ) -> Result<(), ClientError>;
}
