//! Short-lived TTL cache for upstream API responses.
//!
//! The store is an explicit interface injected into whatever needs it rather
//! than a process-wide map, so tests can substitute their own and nothing in
//! the crate reaches for global state. Values are JSON strings; callers own
//! the encoding.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// Key/value store with per-entry expiry.
pub trait TtlCache: Send + Sync {
    /// Returns the value for `key` if present and not expired.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key` for `ttl` from now, replacing any previous
    /// entry.
    fn put(&self, key: &str, value: &str, ttl: Duration);
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-memory [`TtlCache`] backed by a read/write locked map.
///
/// Expired entries are dropped lazily: reads ignore them, writes prune the
/// whole map. Good enough for the metadata volumes involved; nothing is
/// persisted across restarts.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TtlCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if Instant::now() >= entry.expires_at {
            return None;
        }
        Some(entry.value.clone())
    }

    fn put(&self, key: &str, value: &str, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_owned(),
            CacheEntry {
                value: value.to_owned(),
                expires_at: now + ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_stored_values_before_expiry() {
        let cache = MemoryCache::new();
        cache.put("video:abc", "{\"title\":\"x\"}", Duration::from_secs(60));
        assert_eq!(cache.get("video:abc").as_deref(), Some("{\"title\":\"x\"}"));
    }

    #[test]
    fn misses_on_unknown_keys() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("video:missing"), None);
    }

    #[test]
    fn expired_entries_are_invisible() {
        let cache = MemoryCache::new();
        cache.put("playlist:p1", "[]", Duration::ZERO);
        assert_eq!(cache.get("playlist:p1"), None);
    }

    #[test]
    fn puts_replace_and_prune() {
        let cache = MemoryCache::new();
        cache.put("k", "old", Duration::ZERO);
        cache.put("k", "new", Duration::from_secs(60));
        assert_eq!(cache.get("k").as_deref(), Some("new"));
        assert_eq!(cache.entries.read().len(), 1);
    }
}
