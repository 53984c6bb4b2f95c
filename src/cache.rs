//! Bounded memo of resolved points.
//!
//! Keyed by the exact bit pattern of `(latitude, longitude)`. When full,
//! the oldest inserted entry is evicted. The resolver works the same with
//! or without a cache.
//!
//! Every read and write names the catalog generation it belongs to. The
//! cache only ever holds entries of the newest generation it has seen:
//! a newer generation wipes it, an older one is ignored.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use hashbrown::HashMap;
use serde::Serialize;

use crate::models::MatchResult;

type PointKey = (u64, u64);

fn key(latitude: f64, longitude: f64) -> PointKey {
    (latitude.to_bits(), longitude.to_bits())
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
    pub generation: u64,
}

#[derive(Default)]
struct Inner {
    generation: u64,
    entries: HashMap<PointKey, MatchResult>,
    order: VecDeque<PointKey>,
    hits: u64,
    misses: u64,
}

impl Inner {
    /// False when `generation` is older than the cached one
    fn accept(&mut self, generation: u64) -> bool {
        if generation > self.generation {
            self.generation = generation;
            self.entries.clear();
            self.order.clear();
        }
        generation == self.generation
    }
}

/// Capacity-limited `point -> MatchResult` map, safe to share across threads.
pub struct LookupCache {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl LookupCache {
    /// A capacity of zero stores nothing
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn get(&self, generation: u64, latitude: f64, longitude: f64) -> Option<MatchResult> {
        let mut inner = self.lock();
        let cached = if inner.accept(generation) {
            inner.entries.get(&key(latitude, longitude)).cloned()
        } else {
            None
        };
        match cached {
            Some(result) => {
                inner.hits += 1;
                Some(result)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    pub fn insert(&self, generation: u64, latitude: f64, longitude: f64, result: MatchResult) {
        if self.capacity == 0 {
            return;
        }

        let k = key(latitude, longitude);
        let mut inner = self.lock();
        if !inner.accept(generation) {
            return;
        }
        if inner.entries.insert(k, result).is_some() {
            return;
        }
        inner.order.push_back(k);

        while inner.entries.len() > self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    /// Drop all entries, keeping counters
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    /// Move to `generation`, dropping entries of any older one
    pub fn advance(&self, generation: u64) {
        self.lock().accept(generation);
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.entries.len(),
            capacity: self.capacity,
            generation: inner.generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(name: &str) -> MatchResult {
        MatchResult::FallbackMatched {
            area: name.to_string(),
            micromarket: name.to_string(),
            zone: format!("{} Bangalore", name),
        }
    }

    #[test]
    fn test_get_after_insert() {
        let cache = LookupCache::new(4);
        assert!(cache.get(0, 12.9, 77.6).is_none());
        cache.insert(0, 12.9, 77.6, area("BTM Layout"));
        assert_eq!(cache.get(0, 12.9, 77.6), Some(area("BTM Layout")));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_capacity_bound_evicts_oldest() {
        let cache = LookupCache::new(2);
        cache.insert(0, 1.0, 1.0, area("a"));
        cache.insert(0, 2.0, 2.0, area("b"));
        cache.insert(0, 3.0, 3.0, area("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(0, 1.0, 1.0).is_none());
        assert_eq!(cache.get(0, 3.0, 3.0), Some(area("c")));
    }

    #[test]
    fn test_reinsert_does_not_grow() {
        let cache = LookupCache::new(2);
        cache.insert(0, 1.0, 1.0, area("a"));
        cache.insert(0, 1.0, 1.0, area("a2"));
        cache.insert(0, 2.0, 2.0, area("b"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(0, 1.0, 1.0), Some(area("a2")));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = LookupCache::new(0);
        cache.insert(0, 1.0, 1.0, area("a"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = LookupCache::new(8);
        cache.insert(0, 1.0, 1.0, area("a"));
        cache.clear();
        assert!(cache.get(0, 1.0, 1.0).is_none());
        assert_eq!(cache.capacity(), 8);
    }

    #[test]
    fn test_older_generation_is_ignored() {
        let cache = LookupCache::new(4);
        cache.insert(1, 1.0, 1.0, area("new"));

        // A lookup that started before the swap finishes late
        cache.insert(0, 2.0, 2.0, area("old"));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(0, 1.0, 1.0).is_none());
        assert_eq!(cache.get(1, 1.0, 1.0), Some(area("new")));
    }

    #[test]
    fn test_newer_generation_wipes_entries() {
        let cache = LookupCache::new(4);
        cache.insert(0, 1.0, 1.0, area("a"));
        cache.advance(3);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().generation, 3);
        assert!(cache.get(3, 1.0, 1.0).is_none());

        cache.advance(1);
        assert_eq!(cache.stats().generation, 3);
    }
}
