use thiserror::Error;

/// Errors surfaced by the inquiry service and the reconciliation layer.
///
/// Transport failures are transient from the caller's point of view: the
/// optimistic local state is retained and the operation is retried only on
/// explicit user action.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("service request failed: {0}")]
    Transport(String),

    #[error("inquiry not found: {0}")]
    InquiryNotFound(String),

    #[error("attachment not found: {0}")]
    AttachmentNotFound(String),

    #[error("no open thread for inquiry: {0}")]
    ThreadNotOpen(String),

    #[error("upload of {file_name} exceeds the size limit ({size} > {limit} bytes)")]
    UploadTooLarge {
        file_name: String,
        size: u64,
        limit: u64,
    },

    #[error("session closed")]
    SessionClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
