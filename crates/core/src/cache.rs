//! Bounded LRU result cache for the Search Engine (C8).
//!
//! A hand-rolled `HashMap` + recency `VecDeque` rather than a crate: the
//! default capacity (100 entries) is small enough that a linear scan on the
//! rare eviction path is cheaper than depending on something built for much
//! larger working sets.

use std::collections::{HashMap, VecDeque};

use crate::search::SearchResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub query: String,
    pub limit: usize,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
    pub capacity: usize,
}

pub struct LruResultCache {
    capacity: usize,
    entries: HashMap<CacheKey, Vec<SearchResult>>,
    /// Most-recently-used key is at the back.
    recency: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

impl LruResultCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            recency: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Looks up `key`, promoting it to most-recently-used on a hit.
    pub fn get(&mut self, key: &CacheKey) -> Option<Vec<SearchResult>> {
        match self.entries.get(key) {
            Some(results) => {
                self.hits += 1;
                self.touch(key);
                Some(results.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Inserts `results` for `key`, evicting the least-recently-used entry
    /// if this insert would exceed capacity. Entries are immutable once
    /// inserted; re-inserting the same key replaces it and promotes it.
    pub fn insert(&mut self, key: CacheKey, results: Vec<SearchResult>) {
        if self.entries.contains_key(&key) {
            self.entries.insert(key.clone(), results);
            self.touch(&key);
            return;
        }

        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.recency.pop_front() {
                self.entries.remove(&oldest);
            }
        }

        self.entries.insert(key.clone(), results);
        self.recency.push_back(key);
    }

    /// Drops every entry. Called on every committed `IndexStore` mutation
    /// (spec.md §5: "Any mutation ... invalidates the cache entirely").
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats { hits: self.hits, misses: self.misses, len: self.entries.len(), capacity: self.capacity }
    }

    fn touch(&mut self, key: &CacheKey) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            let k = self.recency.remove(pos).unwrap();
            self.recency.push_back(k);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(q: &str) -> CacheKey {
        CacheKey { query: q.to_string(), limit: 10 }
    }

    #[test]
    fn hit_after_insert() {
        let mut cache = LruResultCache::new(2);
        cache.insert(key("a"), vec![]);
        assert!(cache.get(&key("a")).is_some());
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn evicts_least_recently_used_on_overflow() {
        let mut cache = LruResultCache::new(2);
        cache.insert(key("a"), vec![]);
        cache.insert(key("b"), vec![]);
        // touch "a" so "b" becomes the LRU entry
        cache.get(&key("a"));
        cache.insert(key("c"), vec![]);

        assert!(cache.get(&key("a")).is_some());
        assert!(cache.get(&key("b")).is_none());
        assert!(cache.get(&key("c")).is_some());
    }

    #[test]
    fn clear_drops_everything() {
        let mut cache = LruResultCache::new(2);
        cache.insert(key("a"), vec![]);
        cache.clear();
        assert!(cache.get(&key("a")).is_none());
        assert_eq!(cache.stats().len, 0);
    }
}
