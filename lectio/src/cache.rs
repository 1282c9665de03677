//! Search result caching with LRU eviction

use crate::search::{SearchFilters, SearchResults, SearchStatus};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct SearchKey {
    pub query: String,
    pub filters: SearchFilters,
}

impl SearchKey {
    /// `query` must already be normalized.
    pub fn new(query: impl Into<String>, filters: &SearchFilters) -> Self {
        Self {
            query: query.into(),
            filters: filters.canonical(),
        }
    }
}

pub struct SearchCache {
    cache: Mutex<LruCache<SearchKey, Arc<SearchResults>>>,
}

impl SearchCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<SearchKey, Arc<SearchResults>>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &SearchKey) -> Option<Arc<SearchResults>> {
        self.lock().get(key).cloned()
    }

    /// Returns the cached results or computes and stores them. Rejected
    /// (too short) queries are returned but never stored.
    pub fn get_or_insert_with<F>(&self, key: SearchKey, compute: F) -> Arc<SearchResults>
    where
        F: FnOnce() -> SearchResults,
    {
        if let Some(hit) = self.get(&key) {
            return hit;
        }

        // Computed outside the lock; a concurrent miss on the same key just
        // computes the same results twice.
        let results = Arc::new(compute());
        if results.status != SearchStatus::TooShort {
            self.lock().put(key, Arc::clone(&results));
        }
        results
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// (entries, capacity)
    pub fn stats(&self) -> (usize, usize) {
        let cache = self.lock();
        (cache.len(), cache.cap().get())
    }
}
