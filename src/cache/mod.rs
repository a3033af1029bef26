//! TTL response cache keyed by operation, identity, and input fingerprint.
//!
//! Thread-safe, in-memory, lazy expiry on lookup. No eviction beyond TTL:
//! unbounded growth is an accepted limitation of the in-memory design; a
//! production deployment should cap size or move this behind an external
//! store.

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::analysis::types::OperationKind;
use crate::quota::Identity;

/// Cache key. Includes the identity so one requester's cached result is
/// never served to another, even for byte-identical input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: OperationKind,
    pub identity: Identity,
    pub fingerprint: String,
}

impl CacheKey {
    pub fn new(kind: OperationKind, identity: Identity, fingerprint: String) -> Self {
        Self {
            kind,
            identity,
            fingerprint,
        }
    }
}

/// Deterministic SHA-256 hex digest of normalized input text.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    expires_at: Instant,
    value: V,
}

pub struct ResponseCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> ResponseCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a key. An entry past its TTL is purged on this read and
    /// reported absent.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at <= Instant::now() => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Store a value, overwriting unconditionally.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        let mut entries = self.entries.lock();
        entries.insert(
            key,
            CacheEntry {
                expires_at: Instant::now() + ttl,
                value,
            },
        );
    }

    /// Live entry count (expired entries purged first).
    pub fn len(&self) -> usize {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for ResponseCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn key(fp: &str) -> CacheKey {
        CacheKey::new(OperationKind::Analyze, 42, fp.to_string())
    }

    #[test]
    fn fingerprint_is_deterministic_and_distinct() {
        assert_eq!(fingerprint("resume"), fingerprint("resume"));
        assert_ne!(fingerprint("resume"), fingerprint("resume "));
        assert_eq!(fingerprint("").len(), 64);
    }

    #[test]
    fn stores_and_retrieves_within_ttl() {
        let cache: ResponseCache<CacheKey, String> = ResponseCache::new();
        cache.set(key("a"), "value".into(), Duration::from_secs(60));
        assert_eq!(cache.get(&key("a")).as_deref(), Some("value"));
    }

    #[test]
    fn expired_entry_is_purged_on_read() {
        let cache: ResponseCache<CacheKey, String> = ResponseCache::new();
        cache.set(key("a"), "value".into(), Duration::from_millis(20));
        thread::sleep(Duration::from_millis(30));
        assert!(cache.get(&key("a")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn set_overwrites_unconditionally() {
        let cache: ResponseCache<CacheKey, String> = ResponseCache::new();
        cache.set(key("a"), "first".into(), Duration::from_secs(60));
        cache.set(key("a"), "second".into(), Duration::from_secs(60));
        assert_eq!(cache.get(&key("a")).as_deref(), Some("second"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn identity_isolates_cache_entries() {
        let cache: ResponseCache<CacheKey, String> = ResponseCache::new();
        let fp = fingerprint("same text");
        cache.set(
            CacheKey::new(OperationKind::Analyze, 1, fp.clone()),
            "for user 1".into(),
            Duration::from_secs(60),
        );
        assert!(cache
            .get(&CacheKey::new(OperationKind::Analyze, 2, fp.clone()))
            .is_none());
        // operation kind isolates too
        assert!(cache
            .get(&CacheKey::new(OperationKind::Rewrite, 1, fp))
            .is_none());
    }
}
