//! Inquiry session - drives the fetch/send/upload flows against the service
//!
//! The session owns the thread store and both client-side caches and is their
//! only writer. Every mutation goes through the optimistic-then-reconcile
//! protocol: local appends are visible immediately, and a full reload
//! re-normalizes and re-correlates to replace them with authoritative data.

use crate::correlate::CorrelatorConfig;
use crate::dedup::dedupe_by_listing;
use crate::thread::{ThreadState, ThreadStore};
use domus_cache::{MediaCache, UnitCache};
use domus_client::{
    Attachment, AttachmentUpload, ClientError, InquiryService, InquiryStatus, Message, Sender,
    Unit,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Attachment correlation window (see [`CorrelatorConfig`]).
    pub correlation: CorrelatorConfig,

    /// Which side of the conversation this session renders for.
    pub viewer: Sender,

    /// Location of the persisted unit cache; `None` picks the platform
    /// default.
    pub unit_cache_path: Option<PathBuf>,

    /// Maximum accepted upload size in bytes (default: 25MB).
    pub max_upload_size: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            correlation: CorrelatorConfig::default(),
            viewer: Sender::Manager,
            unit_cache_path: None,
            max_upload_size: 25 * 1024 * 1024,
        }
    }
}

/// One row of the deduplicated inquiry list.
#[derive(Debug, Clone, PartialEq)]
pub struct InquirySummary {
    pub inquiry_id: String,
    pub listing_id: String,
    pub status: InquiryStatus,
    pub last_preview: Option<String>,
    pub unread: u32,
}

/// Coordinator for one open portal view.
///
/// All state lives behind a single async mutex; service calls are the only
/// suspension points and no lock is held across them.
pub struct InquirySession {
    service: Arc<dyn InquiryService>,
    store: Mutex<ThreadStore>,
    media: MediaCache,
    units: Mutex<UnitCache>,
    live: AtomicBool,
    config: SessionConfig,
}

impl InquirySession {
    pub fn new(service: Arc<dyn InquiryService>) -> Self {
        Self::with_config(service, SessionConfig::default())
    }

    pub fn with_config(service: Arc<dyn InquiryService>, config: SessionConfig) -> Self {
        let unit_cache = match &config.unit_cache_path {
            Some(path) => UnitCache::open(path.clone()),
            None => UnitCache::open_default(),
        };

        info!("Inquiry session opened (viewer: {:?})", config.viewer);
        Self {
            service,
            store: Mutex::new(ThreadStore::new(config.correlation.clone(), config.viewer)),
            media: MediaCache::new(),
            units: Mutex::new(unit_cache),
            live: AtomicBool::new(true),
            config,
        }
    }

    /// Fetch the full inquiry list, deduplicate to one row per listing,
    /// reconcile every surviving record, and return list summaries in order.
    pub async fn load_inquiries(&self) -> Result<Vec<InquirySummary>, ClientError> {
        self.ensure_live()?;
        let inquiries = dedupe_by_listing(self.service.fetch_inquiries().await?);

        let mut loaded = Vec::with_capacity(inquiries.len());
        for inquiry in inquiries {
            let attachments = self.service.fetch_attachments(&inquiry.id).await?;
            loaded.push((inquiry, attachments));
        }

        let mut store = self.store.lock().await;
        let ids: Vec<String> = loaded.iter().map(|(inq, _)| inq.id.clone()).collect();
        for (inquiry, attachments) in loaded {
            store.reconcile(inquiry, attachments);
        }
        store.retain(&ids);

        Ok(store
            .iter_in_order()
            .map(InquirySession::summarize)
            .collect())
    }

    /// Open one inquiry: fetch and reconcile it, select it, reset its unread
    /// counter.
    pub async fn open_inquiry(&self, inquiry_id: &str) -> Result<(), ClientError> {
        self.ensure_live()?;
        let inquiry = self.service.fetch_inquiry(inquiry_id).await?;
        let attachments = self.service.fetch_attachments(inquiry_id).await?;

        let mut store = self.store.lock().await;
        store.reconcile(inquiry, attachments);
        store.select(inquiry_id);
        store.mark_read(inquiry_id);
        Ok(())
    }

    /// Send a message through the two-phase optimistic protocol.
    ///
    /// The message is appended locally first and is visible immediately; a
    /// successful send triggers a full reload that reconciles it against the
    /// authoritative server copy. A failed send keeps the optimistic entry in
    /// place and surfaces the error for the user to retry explicitly - an
    /// accepted trade-off, not a rollback.
    pub async fn send_message(&self, inquiry_id: &str, text: &str) -> Result<Message, ClientError> {
        self.ensure_live()?;
        let local = {
            let mut store = self.store.lock().await;
            store
                .append_local(inquiry_id, self.config.viewer, text)
                .ok_or_else(|| ClientError::ThreadNotOpen(inquiry_id.to_string()))?
        };

        match self.service.send_message(inquiry_id, text).await {
            Ok(()) => {
                self.reload(inquiry_id).await?;
                Ok(local)
            }
            Err(e) => {
                warn!("Send to {} failed, optimistic entry retained: {}", inquiry_id, e);
                Err(e)
            }
        }
    }

    /// Upload files to an inquiry, then reload so the correlator can place
    /// them.
    pub async fn upload_attachments(
        &self,
        inquiry_id: &str,
        mut uploads: Vec<AttachmentUpload>,
    ) -> Result<Vec<Attachment>, ClientError> {
        self.ensure_live()?;
        for upload in &mut uploads {
            let size = upload.data.len() as u64;
            if size > self.config.max_upload_size {
                return Err(ClientError::UploadTooLarge {
                    file_name: upload.file_name.clone(),
                    size,
                    limit: self.config.max_upload_size,
                });
            }
            if upload.file_type.is_none() {
                upload.file_type = Some(upload.resolved_type());
            }
        }

        let created = self.service.upload_attachments(inquiry_id, uploads).await?;
        debug!("Uploaded {} attachments to {}", created.len(), inquiry_id);
        self.reload(inquiry_id).await?;
        Ok(created)
    }

    /// An attachment's binary content, fetched at most once per session.
    ///
    /// An individual failure degrades that one item only; the rest of the
    /// thread is unaffected.
    pub async fn attachment_data(&self, attachment_id: &str) -> Result<Vec<u8>, ClientError> {
        self.ensure_live()?;
        if let Some(bytes) = self.media.get(attachment_id) {
            return Ok(bytes);
        }

        let bytes = self.service.download_attachment(attachment_id).await?;
        // The fetch may complete after the owning view was torn down; do not
        // write into a dead session's cache.
        if self.live.load(Ordering::SeqCst) {
            self.media.insert(attachment_id, bytes.clone());
        }
        Ok(bytes)
    }

    /// Assign the inquiring tenant to a listing/unit. The inquiry's status
    /// becomes `assigned` with the reload this triggers.
    pub async fn assign_tenant(
        &self,
        inquiry_id: &str,
        listing_id: &str,
        unit_id: Option<&str>,
    ) -> Result<(), ClientError> {
        self.ensure_live()?;
        self.service
            .assign_tenant(inquiry_id, listing_id, unit_id)
            .await?;
        info!("Assigned tenant for inquiry {} on listing {}", inquiry_id, listing_id);
        self.reload(inquiry_id).await
    }

    /// Last-known units for a listing, for instant redisplay before a fresh
    /// fetch lands.
    pub async fn cached_units(&self, listing_id: &str) -> Vec<Unit> {
        self.units
            .lock()
            .await
            .get(listing_id)
            .map(<[Unit]>::to_vec)
            .unwrap_or_default()
    }

    /// Fresh units for a listing, written through to the persisted cache.
    pub async fn fetch_units(&self, listing_id: &str) -> Result<Vec<Unit>, ClientError> {
        self.ensure_live()?;
        let units = self.service.fetch_units(listing_id).await?;
        if let Err(e) = self.units.lock().await.put(listing_id, units.clone()) {
            // Cache persistence is best-effort; the fresh data still stands.
            warn!("Unit cache write for {} failed: {:#}", listing_id, e);
        }
        Ok(units)
    }

    /// A snapshot of one thread's reconciled state.
    pub async fn thread(&self, inquiry_id: &str) -> Option<ThreadState> {
        self.store.lock().await.get(inquiry_id).cloned()
    }

    /// The currently selected inquiry, if any.
    pub async fn selected(&self) -> Option<String> {
        self.store.lock().await.selected().map(str::to_string)
    }

    /// List summaries in the current order.
    pub async fn summaries(&self) -> Vec<InquirySummary> {
        self.store
            .lock()
            .await
            .iter_in_order()
            .map(InquirySession::summarize)
            .collect()
    }

    /// Tear the session down: pending async completions will not touch state
    /// any more, and per-session caches and thread state are discarded.
    pub async fn close(&self) {
        self.live.store(false, Ordering::SeqCst);
        self.media.clear();
        self.store.lock().await.clear();
        info!("Inquiry session closed");
    }

    async fn reload(&self, inquiry_id: &str) -> Result<(), ClientError> {
        let inquiry = self.service.fetch_inquiry(inquiry_id).await?;
        let attachments = self.service.fetch_attachments(inquiry_id).await?;

        let mut store = self.store.lock().await;
        store.reconcile(inquiry, attachments);
        store.select_after_reconcile(inquiry_id);
        Ok(())
    }

    fn summarize(state: &ThreadState) -> InquirySummary {
        InquirySummary {
            inquiry_id: state.inquiry.id.clone(),
            listing_id: state.inquiry.listing_id.clone(),
            status: state.inquiry.status,
            last_preview: state.last_preview.clone(),
            unread: state.unread,
        }
    }

    fn ensure_live(&self) -> Result<(), ClientError> {
        if self.live.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ClientError::SessionClosed)
        }
    }
}
