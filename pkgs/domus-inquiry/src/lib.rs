//! Domus Inquiry - thread reconstruction and attachment correlation
//!
//! This crate turns backend-supplied inquiry records into correctly ordered,
//! display-ready conversation threads and keeps them consistent across
//! optimistic local updates and server-confirmed reloads.
//!
//! # Architecture
//!
//! The reconciliation pipeline runs leaves-first:
//!
//! - **legacy**: decodes the old free-text storage format (one blob with
//!   embedded `--- New Message [ms] ---` markers) into discrete fragments.
//! - **normalize**: produces the canonical message list for an inquiry,
//!   preferring the structured message array and falling back to the legacy
//!   decoder.
//! - **correlate**: assigns each uploaded attachment to the message it
//!   accompanies using a wall-clock proximity window, since the backend
//!   records no explicit message-attachment link.
//! - **thread**: the [`ThreadStore`], the single place the rendered view
//!   reads from; supports optimistic append, wholesale reconcile against
//!   fresh server data, and race-guarded selection.
//! - **dedup**: collapses the backend's inquiry rows to one visible row per
//!   listing.
//! - **session**: the [`InquirySession`] coordinator that drives the
//!   send/upload/reload flows against an [`domus_client::InquiryService`]
//!   and owns the unit and media caches.
//!
//! Control flow: backend payload -> normalize -> correlate (consuming a
//! parallel attachment fetch) -> thread store -> render. Sends and uploads
//! append optimistically, then trigger a full reload that re-normalizes and
//! re-correlates to reconcile.

pub mod correlate;
pub mod dedup;
pub mod legacy;
pub mod normalize;
pub mod session;
pub mod thread;

pub use correlate::{correlate, CorrelatedThread, CorrelatorConfig, ThreadEntry};
pub use dedup::dedupe_by_listing;
pub use legacy::{decode, decode_at, Fragment};
pub use normalize::{normalize, normalize_at};
pub use session::{InquirySession, InquirySummary, SessionConfig};
pub use thread::{ThreadState, ThreadStore};
