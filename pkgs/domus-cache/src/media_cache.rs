//! Media cache - session-scoped store of downloaded attachment bytes

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// In-memory blob cache keyed by attachment identifier.
///
/// A blob is fetched at most once per session; there is no eviction. Cloning
/// the cache clones the handle, not the contents.
#[derive(Clone, Default)]
pub struct MediaCache {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MediaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached bytes for an attachment, if present.
    pub fn get(&self, attachment_id: &str) -> Option<Vec<u8>> {
        self.blobs.lock().unwrap().get(attachment_id).cloned()
    }

    pub fn contains(&self, attachment_id: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(attachment_id)
    }

    /// Cache the bytes for an attachment, replacing any previous entry.
    pub fn insert(&self, attachment_id: &str, bytes: Vec<u8>) {
        debug!("Caching {} bytes for attachment {}", bytes.len(), attachment_id);
        self.blobs
            .lock()
            .unwrap()
            .insert(attachment_id.to_string(), bytes);
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.lock().unwrap().is_empty()
    }

    /// Drop every cached blob (used on session teardown).
    pub fn clear(&self) {
        self.blobs.lock().unwrap().clear();
    }
}
