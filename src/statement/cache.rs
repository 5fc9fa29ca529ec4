use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use crate::render::CachedSql;

/// Default number of distinct rendered shapes kept per statement.
pub const DEFAULT_TEXT_CACHE_CAPACITY: usize = 256;

/// Bounded LRU of rendered text keyed by caller-supplied cache keys.
pub(crate) struct SqlTextCache {
    entries: Mutex<LruCache<String, Arc<CachedSql>>>,
}

impl SqlTextCache {
    pub(crate) fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<Arc<CachedSql>> {
        let mut guard = self.entries.lock();
        guard.get(key).cloned()
    }

    /// Stores an entry, returning true when another entry was evicted.
    pub(crate) fn insert(&self, key: &str, entry: Arc<CachedSql>) -> bool {
        let mut guard = self.entries.lock();
        match guard.push(key.to_owned(), entry) {
            Some((old_key, _)) => old_key != key,
            None => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[derive(Default)]
pub(crate) struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
    bypasses: AtomicU64,
}

/// Point-in-time view of a statement's text cache counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that had to walk the tree.
    pub misses: u64,
    /// Entries stored.
    pub inserts: u64,
    /// Entries dropped by capacity.
    pub evictions: u64,
    /// Calls rendered without a cache key, or with caching disabled.
    pub bypasses: u64,
    /// Entries currently held.
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of keyed lookups served from the cache.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            return 0.0;
        }
        self.hits as f64 / lookups as f64
    }
}

impl CacheMetrics {
    pub(crate) fn snapshot(&self, entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            bypasses: self.bypasses.load(Ordering::Relaxed),
            entries,
        }
    }

    fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn hit(&self) {
        self.inc(&self.hits);
    }

    pub(crate) fn miss(&self) {
        self.inc(&self.misses);
    }

    pub(crate) fn insert(&self, evicted: bool) {
        self.inc(&self.inserts);
        if evicted {
            self.inc(&self.evictions);
        }
    }

    pub(crate) fn bypass(&self) {
        self.inc(&self.bypasses);
    }
}
