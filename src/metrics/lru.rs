//! LRU Policy Metrics
//!
//! Metrics specific to the LRU (Least Recently Used) eviction policy: how
//! often entries were touched, and how many of those touches created a new
//! queue node rather than moving an existing one to the tail.

use super::CoreEvictionMetrics;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// LRU-specific metrics (extends [`CoreEvictionMetrics`]).
#[derive(Debug, Default)]
pub struct LruPolicyMetrics {
    /// Counters common to all eviction policies.
    pub core: CoreEvictionMetrics,
    touches: AtomicU64,
    enqueued: AtomicU64,
    moved: AtomicU64,
}

impl LruPolicyMetrics {
    /// Creates a set of zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_touch(&self) {
        self.touches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_enqueue(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_move(&self) {
        self.moved.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of touches, including re-touches of entries that refused
    /// eviction.
    pub fn touches(&self) -> u64 {
        self.touches.load(Ordering::Relaxed)
    }

    /// Number of touches that started tracking an entry.
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    /// Number of touches that moved a tracked entry to the tail.
    pub fn moved(&self) -> u64 {
        self.moved.load(Ordering::Relaxed)
    }

    /// Converts LRU metrics to a BTreeMap for reporting.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.core.to_btreemap();
        metrics.insert("touches".to_string(), self.touches() as f64);
        metrics.insert("enqueued".to_string(), self.enqueued() as f64);
        metrics.insert("moved".to_string(), self.moved() as f64);
        metrics
    }
}
