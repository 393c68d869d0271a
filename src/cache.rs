//! In-memory caches shared across an analysis run.
//!
//! Parsing is memoized by exact source text, so classifying a file and
//! later resolving an import back to the same text costs one parser
//! invocation. Registries are memoized per (text, module) pair. Both
//! maps live behind `RwLock`s and are shared by every batch worker.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ahash::{AHashMap, RandomState};
use parking_lot::RwLock;

use crate::classify::SymbolRegistry;
use crate::error::Result;
use crate::parsing::{parse_python, ParsedSource};

/// Cache effectiveness counters, readable at any point of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    /// Lookups answered from the tree cache.
    pub parse_hits: usize,
    /// Actual parser invocations.
    pub parses: usize,
    /// Lookups answered from the registry cache.
    pub registry_hits: usize,
}

pub struct AnalysisCache {
    hasher: RandomState,
    trees: RwLock<AHashMap<u64, Arc<ParsedSource>>>,
    registries: RwLock<AHashMap<u64, Arc<SymbolRegistry>>>,
    parse_hits: AtomicUsize,
    parses: AtomicUsize,
    registry_hits: AtomicUsize,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self {
            hasher: RandomState::new(),
            trees: RwLock::new(AHashMap::new()),
            registries: RwLock::new(AHashMap::new()),
            parse_hits: AtomicUsize::new(0),
            parses: AtomicUsize::new(0),
            registry_hits: AtomicUsize::new(0),
        }
    }

    /// Parse `source`, reusing a cached tree for previously seen text.
    ///
    /// Failed parses are not cached; a malformed file costs a parse
    /// attempt each time something asks for it.
    pub fn parse(&self, source: &str) -> Result<Arc<ParsedSource>> {
        let key = self.hasher.hash_one(source);
        if let Some(hit) = self.trees.read().get(&key) {
            self.parse_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(hit));
        }

        // Two workers racing on the same text both parse it; the
        // second insert wins and the trees are equivalent.
        self.parses.fetch_add(1, Ordering::Relaxed);
        let parsed = Arc::new(parse_python(source)?);
        self.trees.write().insert(key, Arc::clone(&parsed));
        Ok(parsed)
    }

    /// Cached registry for a (text, module) pair, if one was stored.
    pub fn registry(&self, source: &str, module: &str) -> Option<Arc<SymbolRegistry>> {
        let key = self.hasher.hash_one((source, module));
        let hit = self.registries.read().get(&key).map(Arc::clone);
        if hit.is_some() {
            self.registry_hits.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    pub fn store_registry(&self, source: &str, module: &str, registry: Arc<SymbolRegistry>) {
        let key = self.hasher.hash_one((source, module));
        self.registries.write().insert(key, registry);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            parse_hits: self.parse_hits.load(Ordering::Relaxed),
            parses: self.parses.load(Ordering::Relaxed),
            registry_hits: self.registry_hits.load(Ordering::Relaxed),
        }
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_parses_once() {
        let cache = AnalysisCache::new();
        let a = cache.parse("x = 1\n").unwrap();
        let b = cache.parse("x = 1\n").unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        let stats = cache.stats();
        assert_eq!(stats.parses, 1);
        assert_eq!(stats.parse_hits, 1);
    }

    #[test]
    fn distinct_text_parses_separately() {
        let cache = AnalysisCache::new();
        cache.parse("x = 1\n").unwrap();
        cache.parse("y = 2\n").unwrap();
        assert_eq!(cache.stats().parses, 2);
    }

    #[test]
    fn failed_parses_are_not_cached() {
        let cache = AnalysisCache::new();
        assert!(cache.parse("def broken(:\n").is_err());
        assert!(cache.parse("def broken(:\n").is_err());
        assert_eq!(cache.stats().parses, 2);
    }

    #[test]
    fn registry_round_trip_is_keyed_by_module() {
        let cache = AnalysisCache::new();
        let registry = Arc::new(SymbolRegistry::new("a"));
        cache.store_registry("x = 1\n", "a", Arc::clone(&registry));

        assert!(cache.registry("x = 1\n", "a").is_some());
        assert!(cache.registry("x = 1\n", "b").is_none());
        assert!(cache.registry("x = 2\n", "a").is_none());
    }
}
