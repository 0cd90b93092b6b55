//! Domus Cache - client-side caches owned by the reconciliation layer
//!
//! Two small caches back the inquiry views:
//!
//! - **UnitCache**: a JSON-file-persisted key-value store, keyed by listing
//!   identifier, holding the last-known unit list so a listing's units can be
//!   redisplayed instantly before a fresh fetch lands.
//! - **MediaCache**: a session-scoped in-memory store of downloaded
//!   attachment bytes, so a blob is fetched at most once per session.
//!
//! Both are written only through the reconciliation layer; no other component
//! mutates them directly.

mod media_cache;
mod unit_cache;

pub use media_cache::MediaCache;
pub use unit_cache::UnitCache;
