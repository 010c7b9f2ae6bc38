//! Eviction Metrics
//!
//! Counters describing what an eviction policy has done, reported as a
//! `BTreeMap<String, f64>` through the [`CacheMetrics`] trait.
//!
//! # Why BTreeMap over HashMap?
//!
//! - **Deterministic ordering**: metrics always appear in the same order
//! - **Reproducible output**: reports from two runs can be diffed directly
//! - **Better debugging**: consistent output makes logs easier to read
//!
//! # Counting Under Concurrency
//!
//! Policies are updated from many threads without a lock, so every counter is
//! an atomic incremented with relaxed ordering. A report taken while threads
//! are active is a set of individually accurate counters, not a consistent
//! snapshot of all of them.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod lru;

pub use lru::LruPolicyMetrics;

/// Counters shared by all eviction policies.
#[derive(Debug, Default)]
pub struct CoreEvictionMetrics {
    /// Entries successfully evicted by shrink passes.
    evictions: AtomicU64,
    /// Eviction attempts refused by the entry, e.g. because it was pinned.
    eviction_rejections: AtomicU64,
    /// Removal notifications that cleared a tracked entry.
    removals: AtomicU64,
    /// Shrink passes run.
    shrink_passes: AtomicU64,
}

impl CoreEvictionMetrics {
    /// Creates a set of zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful eviction.
    #[inline]
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an eviction the entry refused.
    #[inline]
    pub fn record_eviction_rejection(&self) {
        self.eviction_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a removal notification for a tracked entry.
    #[inline]
    pub fn record_removal(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a completed shrink pass.
    #[inline]
    pub fn record_shrink_pass(&self) {
        self.shrink_passes.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of successful evictions.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Number of refused evictions.
    pub fn eviction_rejections(&self) -> u64 {
        self.eviction_rejections.load(Ordering::Relaxed)
    }

    /// Number of removal notifications that cleared a tracked entry.
    pub fn removals(&self) -> u64 {
        self.removals.load(Ordering::Relaxed)
    }

    /// Number of shrink passes.
    pub fn shrink_passes(&self) -> u64 {
        self.shrink_passes.load(Ordering::Relaxed)
    }

    /// Ratio of refused evictions to all eviction attempts, or 0.0 if there
    /// were none.
    pub fn rejection_rate(&self) -> f64 {
        let evictions = self.evictions();
        let rejections = self.eviction_rejections();
        let attempts = evictions + rejections;
        if attempts > 0 {
            rejections as f64 / attempts as f64
        } else {
            0.0
        }
    }

    /// Converts the counters to a BTreeMap for reporting.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        metrics.insert("evictions".to_string(), self.evictions() as f64);
        metrics.insert(
            "eviction_rejections".to_string(),
            self.eviction_rejections() as f64,
        );
        metrics.insert("rejection_rate".to_string(), self.rejection_rate());
        metrics.insert("removals".to_string(), self.removals() as f64);
        metrics.insert("shrink_passes".to_string(), self.shrink_passes() as f64);
        metrics
    }
}

/// Trait implemented by every eviction policy for metrics reporting.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Algorithm name for identification (e.g. "LRU").
    fn algorithm_name(&self) -> &'static str;
}
