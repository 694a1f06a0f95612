//! # Time-bounded key/value cache.
//!
//! [`TtlCache`] is safe to share between worker threads (`get`/`put` take `&self`).
//! An entry is visible while `now - created_at <= ttl`; expired entries are evicted
//! lazily on `get` or in bulk by [`TtlCache::purge_expired`].

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use super::clock::{Clock, SystemClock};

/// A cached value plus its creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    pub value: V,
    /// Milliseconds, as reported by the cache's [`Clock`].
    pub created_at: u64,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, created_at: u64) -> Self {
        Self { value, created_at }
    }

    /// `true` once strictly more than `ttl_millis` elapsed since creation.
    pub fn is_expired(&self, now_millis: u64, ttl_millis: u64) -> bool {
        now_millis.saturating_sub(self.created_at) > ttl_millis
    }
}

/// Concurrent map whose entries expire `ttl` after insertion.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl_millis: u64,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Creates a cache on the wall clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl_millis: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
            clock,
        }
    }

    /// Returns the live value for `key`, evicting it if it expired.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now_millis();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now, self.ttl_millis) => {
                    return Some(entry.value.clone())
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write();
        // re-check: a fresh put may have landed between the two locks
        if entries
            .get(key)
            .is_some_and(|e| e.is_expired(now, self.ttl_millis))
        {
            entries.remove(key);
        }
        None
    }

    /// Inserts or replaces `key`, stamped with the current time.
    pub fn put(&self, key: K, value: V) {
        let entry = CacheEntry::new(value, self.clock.now_millis());
        self.entries.write().insert(key, entry);
    }

    /// Returns the cached value or computes, stores and returns a new one.
    ///
    /// `f` runs without holding the lock; two threads missing at once both compute
    /// and the last `put` wins.
    pub fn get_or_insert_with(&self, key: K, f: impl FnOnce() -> V) -> V {
        if let Some(v) = self.get(&key) {
            return v;
        }
        let value = f();
        self.put(key, value.clone());
        value
    }

    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.write().remove(key).map(|e| e.value)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of stored entries, expired ones included until evicted.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now, self.ttl_millis));
        before - entries.len()
    }
}

impl<K, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl_millis", &self.ttl_millis)
            .field("len", &self.entries.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    fn cache(ttl_ms: u64) -> (Arc<ManualClock>, TtlCache<String, u32>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = TtlCache::with_clock(Duration::from_millis(ttl_ms), clock.clone());
        (clock, cache)
    }

    #[test]
    fn test_entry_expiry_is_strict() {
        let e = CacheEntry::new((), 100);
        assert!(!e.is_expired(150, 50));
        assert!(e.is_expired(151, 50));
        // clock going backwards never expires
        assert!(!e.is_expired(10, 50));
    }

    #[test]
    fn test_get_until_ttl_then_absent() {
        let (clock, cache) = cache(60_000);
        cache.put("a".into(), 1);
        assert_eq!(cache.get("a"), Some(1));

        clock.advance(60_000);
        assert_eq!(cache.get("a"), Some(1));

        clock.advance(1);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.len(), 0, "expired entry evicted on get");
    }

    #[test]
    fn test_clock_set_back_keeps_entry() {
        let (clock, cache) = cache(10);
        cache.put("a".into(), 1);
        clock.set(0);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.purge_expired(), 0);

        clock.set(1_011);
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_put_refreshes_timestamp() {
        let (clock, cache) = cache(10);
        cache.put("a".into(), 1);
        clock.advance(8);
        cache.put("a".into(), 2);
        clock.advance(8);
        assert_eq!(cache.get("a"), Some(2));
    }

    #[test]
    fn test_get_or_insert_with_computes_once_while_fresh() {
        let (clock, cache) = cache(10);
        let mut calls = 0;
        let mut load = || {
            calls += 1;
            calls
        };
        assert_eq!(cache.get_or_insert_with("k".into(), &mut load), 1);
        assert_eq!(cache.get_or_insert_with("k".into(), &mut load), 1);
        clock.advance(11);
        assert_eq!(cache.get_or_insert_with("k".into(), &mut load), 2);
    }

    #[test]
    fn test_purge_and_clear() {
        let (clock, cache) = cache(10);
        cache.put("old".into(), 1);
        clock.advance(20);
        cache.put("new".into(), 2);

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.remove("new"), Some(2));

        cache.put("x".into(), 3);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_put_get() {
        let cache = Arc::new(TtlCache::<u32, u32>::new(Duration::from_secs(60)));
        let threads: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        cache.put(t * 1000 + i, i);
                        assert_eq!(cache.get(&(t * 1000 + i)), Some(i));
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().expect("thread");
        }
        assert_eq!(cache.len(), 400);
    }
}
