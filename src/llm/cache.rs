use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// How many responses the cache may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Keep every response for the lifetime of the client
    #[default]
    Unbounded,
    /// Evict the least recently used entry beyond this many
    Bounded(NonZeroUsize),
}

impl CachePolicy {
    /// `0` means unbounded
    pub fn from_capacity(capacity: usize) -> Self {
        match NonZeroUsize::new(capacity) {
            Some(cap) => CachePolicy::Bounded(cap),
            None => CachePolicy::Unbounded,
        }
    }
}

/// Response cache keyed by request content
pub struct ResponseCache<V> {
    entries: Mutex<LruCache<String, V>>,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(policy: CachePolicy) -> Self {
        let entries = match policy {
            CachePolicy::Unbounded => LruCache::unbounded(),
            CachePolicy::Bounded(cap) => LruCache::new(cap),
        };
        ResponseCache {
            entries: Mutex::new(entries),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().get(key).cloned()
    }

    pub fn set(&self, key: String, value: V) {
        if let Some((evicted, _)) = self.lock().push(key, value) {
            tracing::trace!(key = %evicted, "cache entry displaced");
        }
    }

    /// Number of cached responses
    pub fn entry_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, V>> {
        // Entries stay consistent even if a holder panicked
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_keeps_everything() {
        assert_eq!(CachePolicy::from_capacity(0), CachePolicy::Unbounded);
        let cache = ResponseCache::new(CachePolicy::from_capacity(0));
        for i in 0..500 {
            cache.set(format!("k{}", i), i);
        }
        assert_eq!(cache.entry_count(), 500);
        assert_eq!(cache.get("k0"), Some(0));
    }

    #[test]
    fn test_bounded_evicts_least_recently_used() {
        let cache = ResponseCache::new(CachePolicy::from_capacity(2));
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        assert_eq!(cache.get("a"), Some(1));

        cache.set("c".to_string(), 3);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn test_set_replaces_existing_value() {
        let cache = ResponseCache::new(CachePolicy::Unbounded);
        cache.set("k".to_string(), 1);
        cache.set("k".to_string(), 2);
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.entry_count(), 1);
    }
}
