//! Memoized utilities keyed by bias constant
//!
//! Fitness is a pure function of the constant, so every distinct value only
//! needs to be simulated once per process. Writes are compute-and-store-if-absent
//! without any transactional guarantee: two threads racing on the same value
//! both compute it and store the same bits.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::constant::{BIAS_DOMAIN, BiasConstant};

/// Shared store of computed utilities
pub trait UtilityCache: Send + Sync {
    /// Previously stored utility for `value`, if any
    fn get(&self, value: BiasConstant) -> Option<f32>;

    /// Store `utility` for `value`; last write wins
    fn insert(&self, value: BiasConstant, utility: f32);

    /// Lookup statistics
    fn stats(&self) -> CacheStats;
}

/// Which [`UtilityCache`] implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// One slot per possible constant (1 GiB, O(1) lookups)
    #[default]
    Dense,
    /// Concurrent hash map holding only evaluated constants
    Sparse,
}

impl CacheMode {
    pub fn build(self) -> Arc<dyn UtilityCache> {
        match self {
            CacheMode::Dense => Arc::new(DenseUtilityCache::new()),
            CacheMode::Sparse => Arc::new(SparseUtilityCache::new()),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    /// Hit rate in percent
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            (self.hits as f64 / lookups as f64) * 100.0
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Counters {
    #[inline]
    fn record<T>(&self, found: Option<T>) -> Option<T> {
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Dense table with one atomic slot per constant.
///
/// Slots hold `f32` bit patterns; an all-zero slot means "not computed". A
/// utility of exactly `0.0` is therefore never remembered and is recomputed
/// on every request, which is harmless because recomputation is idempotent.
pub struct DenseUtilityCache {
    slots: Box<[AtomicU32]>,
    counters: Counters,
}

impl DenseUtilityCache {
    pub fn new() -> Self {
        log::info!(
            "allocating dense utility table: {} slots ({} MiB)",
            BIAS_DOMAIN,
            BIAS_DOMAIN * size_of::<AtomicU32>() / (1024 * 1024)
        );
        let slots = (0..BIAS_DOMAIN).map(|_| AtomicU32::new(0)).collect();
        Self {
            slots,
            counters: Counters::default(),
        }
    }
}

impl Default for DenseUtilityCache {
    fn default() -> Self {
        Self::new()
    }
}

impl UtilityCache for DenseUtilityCache {
    #[inline]
    fn get(&self, value: BiasConstant) -> Option<f32> {
        let bits = self.slots[value.get() as usize].load(Ordering::Relaxed);
        self.counters
            .record((bits != 0).then(|| f32::from_bits(bits)))
    }

    #[inline]
    fn insert(&self, value: BiasConstant, utility: f32) {
        self.slots[value.get() as usize].store(utility.to_bits(), Ordering::Relaxed);
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

/// Sparse cache for runs that only ever touch a small part of the domain
#[derive(Default)]
pub struct SparseUtilityCache {
    map: DashMap<u32, f32>,
    counters: Counters,
}

impl SparseUtilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl UtilityCache for SparseUtilityCache {
    fn get(&self, value: BiasConstant) -> Option<f32> {
        self.counters
            .record(self.map.get(&value.get()).map(|entry| *entry))
    }

    fn insert(&self, value: BiasConstant, utility: f32) {
        self.map.insert(value.get(), utility);
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_sparse_get_insert() {
        let cache = SparseUtilityCache::new();
        let v = BiasConstant::new(42);
        assert_eq!(cache.get(v), None);
        cache.insert(v, 1.5);
        assert_eq!(cache.get(v), Some(1.5));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
        assert_eq!(cache.stats().hit_rate(), 50.0);
    }

    #[test]
    fn test_sparse_concurrent_writers_same_key() {
        let cache = Arc::new(SparseUtilityCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for v in 0..1000u32 {
                        cache.insert(BiasConstant::new(v), v as f32 + 0.5);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 1000);
        assert_eq!(cache.get(BiasConstant::new(999)), Some(999.5));
    }

    #[test]
    #[ignore = "allocates a 1 GiB table"]
    fn test_dense_get_insert() {
        let cache = DenseUtilityCache::new();
        let v = BiasConstant::new(0x0FFF_FFFF);
        assert_eq!(cache.get(v), None);
        cache.insert(v, 3.25);
        assert_eq!(cache.get(v), Some(3.25));
        // zero is indistinguishable from an empty slot
        cache.insert(BiasConstant::new(1), 0.0);
        assert_eq!(cache.get(BiasConstant::new(1)), None);
    }
}
