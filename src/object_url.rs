//! Browsable handles for encoded images.
//!
//! An [`ObjectUrlStore`] plays the role of a host's object-URL allocator: it
//! hands out process-local `blob:` URLs that resolve to shared bytes without
//! copying them. A URL stays live until the caller revokes it.

use crate::upload::Blob;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Scheme and authority of every URL this store allocates.
pub const OBJECT_URL_PREFIX: &str = "blob:pdf2img/";

/// Allocator for `blob:` URLs backed by in-memory [`Blob`]s.
#[derive(Debug, Default)]
pub struct ObjectUrlStore {
    next_id: AtomicU64,
    entries: Mutex<HashMap<String, Blob>>,
}

impl ObjectUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh URL for `blob`. Every call yields a distinct URL,
    /// even for identical bytes.
    pub fn create(&self, blob: Blob) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = format!("{OBJECT_URL_PREFIX}{id:016x}");
        debug!("Allocated {} ({} bytes, {})", url, blob.len(), blob.mime_type());
        self.entries().insert(url.clone(), blob);
        url
    }

    /// The blob behind a live URL.
    pub fn resolve(&self, url: &str) -> Option<Blob> {
        self.entries().get(url).cloned()
    }

    /// Release a URL. Returns `false` if it was unknown or already revoked.
    pub fn revoke(&self, url: &str) -> bool {
        let removed = self.entries().remove(url).is_some();
        if removed {
            debug!("Revoked {}", url);
        }
        removed
    }

    /// Number of live URLs.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Blob>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
