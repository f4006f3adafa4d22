//! Shared LRU caching used by the query facade and the trace engine.
//!
//! Mirrors the cache shape from the HMAC/LRU verification cache pattern:
//! an `lru::LruCache` behind a `Mutex`, entries timestamped so a reader can
//! enforce a TTL on top of LRU eviction.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

/// Identifies one cached facade call: the operation name, a hash of its
/// normalized arguments, and a fingerprint of the store content the result
/// was computed against. A mutation that changes the fingerprint silently
/// invalidates every entry computed from the old content, without an
/// explicit invalidation pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    operation: &'static str,
    args_fingerprint: u64,
    content_fingerprint: (i32, i64),
}

impl CacheKey {
    /// `content_fingerprint` is `(schema_version, node_count + edge_count)`
    /// -- a cheap proxy for "has anything changed", not a precise
    /// max-tx_from watermark, since [`arc_store::Stats`] doesn't expose one.
    pub fn new(operation: &'static str, args: impl Hash, content_fingerprint: (i32, i64)) -> Self {
        let mut hasher = DefaultHasher::new();
        args.hash(&mut hasher);
        Self { operation, args_fingerprint: hasher.finish(), content_fingerprint }
    }
}

struct Entry<T> {
    value: T,
    inserted_at: Instant,
}

/// A TTL-aware LRU cache for facade results.
pub struct ResultCache<T> {
    inner: Mutex<LruCache<CacheKey, Entry<T>>>,
    ttl: Duration,
}

impl<T: Clone> ResultCache<T> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to at least 1");
        Self { inner: Mutex::new(LruCache::new(capacity)), ttl }
    }

    /// Returns the cached value if present and not past its TTL, evicting
    /// it if expired.
    pub fn get(&self, key: &CacheKey) -> Option<T> {
        let mut guard = self.inner.lock().expect("cache mutex poisoned");
        let fresh = guard.get(key).map(|entry| entry.inserted_at.elapsed() <= self.ttl);
        match fresh {
            Some(true) => guard.get(key).map(|entry| entry.value.clone()),
            Some(false) => {
                guard.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: CacheKey, value: T) {
        self.inner.lock().expect("cache mutex poisoned").put(key, Entry { value, inserted_at: Instant::now() });
    }
}

/// Caches blame resolution per `(head_sha, file_path)`. Keyed on the
/// repository's current HEAD sha rather than a TTL: a new commit changes
/// the key outright, so stale entries just age out of the LRU instead of
/// needing an explicit expiry check.
pub struct BlameCache<T> {
    inner: Mutex<LruCache<(String, String), T>>,
}

impl<T: Clone> BlameCache<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity clamped to at least 1");
        Self { inner: Mutex::new(LruCache::new(capacity)) }
    }

    pub fn get(&self, head_sha: &str, file_path: &str) -> Option<T> {
        let mut guard = self.inner.lock().expect("cache mutex poisoned");
        guard.get(&(head_sha.to_string(), file_path.to_string())).cloned()
    }

    pub fn put(&self, head_sha: &str, file_path: &str, value: T) {
        self.inner
            .lock()
            .expect("cache mutex poisoned")
            .put((head_sha.to_string(), file_path.to_string()), value);
    }
}
