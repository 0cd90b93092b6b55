//! Unit cache - persisted per-listing unit lists for instant redisplay

use anyhow::{Context, Result};
use domus_client::Unit;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// JSON-file-backed key-value store of the last-known units per listing.
///
/// The cache is loaded once on open and written through on every put. A
/// missing or unreadable file is not an error: the cache opens empty and the
/// next put recreates it.
pub struct UnitCache {
    path: PathBuf,
    entries: HashMap<String, Vec<Unit>>,
}

impl UnitCache {
    /// Open the cache at `path`, loading whatever is already persisted.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::load(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Unit cache at {} unreadable, starting empty: {e:#}", path.display());
                HashMap::new()
            }
        };

        info!(
            "Unit cache opened at {} ({} listings)",
            path.display(),
            entries.len()
        );
        Self { path, entries }
    }

    /// Open the cache at the platform default location.
    pub fn open_default() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::open(base.join("domus").join("unit-cache.json"))
    }

    fn load(path: &Path) -> Result<HashMap<String, Vec<Unit>>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let raw = std::fs::read_to_string(path).context("Failed to read unit cache file")?;
        serde_json::from_str(&raw).context("Failed to parse unit cache file")
    }

    /// Last-known units for a listing, if any were cached.
    pub fn get(&self, listing_id: &str) -> Option<&[Unit]> {
        self.entries.get(listing_id).map(Vec::as_slice)
    }

    /// Store the fresh unit list for a listing and persist immediately.
    pub fn put(&mut self, listing_id: &str, units: Vec<Unit>) -> Result<()> {
        debug!("Caching {} units for listing {}", units.len(), listing_id);
        self.entries.insert(listing_id.to_string(), units);
        self.persist()
    }

    /// Drop a listing's cached units and persist.
    pub fn remove(&mut self, listing_id: &str) -> Result<bool> {
        let removed = self.entries.remove(listing_id).is_some();
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create unit cache directory")?;
        }
        let raw =
            serde_json::to_string_pretty(&self.entries).context("Failed to encode unit cache")?;
        std::fs::write(&self.path, raw).context("Failed to write unit cache file")?;
        Ok(())
    }
}
