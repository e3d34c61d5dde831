//! Match result cache

use crate::competency::CompetencyId;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// Upper bound on cache entries regardless of configuration
const MAX_CAPACITY: usize = 10_000;

#[derive(Debug, Clone)]
struct CacheEntry {
    candidates: Vec<CompetencyId>,
    stored_at: Instant,
}

/// TTL-bounded LRU cache of context-matching results
pub struct MatchCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl MatchCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.clamp(1, MAX_CAPACITY)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Cached candidates for `key`, if younger than `ttl`
    pub fn get(&self, key: &str, ttl: Duration) -> Option<Vec<CompetencyId>> {
        let mut entries = self.entries.lock();

        let expired = match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < ttl => {
                return Some(entry.candidates.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(key);
        }
        None
    }

    pub fn put(&self, key: &str, candidates: Vec<CompetencyId>) {
        self.entries.lock().put(
            key.to_string(),
            CacheEntry {
                candidates,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every entry; called whenever the registry changes
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
