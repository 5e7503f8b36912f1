//! Zone-id cache owned by each provider instance.

use std::collections::HashMap;
use std::sync::Mutex;

/// Maps a main domain to its provider-side zone identifier.
///
/// Entries are created lazily on the first successful resolution and are
/// never invalidated for the lifetime of the provider instance. Failed
/// resolutions are not cached, so a later call may still succeed. A poisoned
/// lock degrades to a cache miss rather than propagating the panic.
#[derive(Debug, Default)]
pub struct ZoneCache {
    inner: Mutex<HashMap<String, String>>,
}

impl ZoneCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the cached zone id for a main domain.
    pub fn get(&self, main_domain: &str) -> Option<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|map| map.get(main_domain).cloned())
    }

    /// Record a successful resolution.
    pub fn insert(&self, main_domain: &str, zone_id: &str) {
        if let Ok(mut map) = self.inner.lock() {
            map.insert(main_domain.to_string(), zone_id.to_string());
        }
    }
}
