//! Lock-Free Least Recently Used (LRU) Eviction Policy
//!
//! Decides which entries a bounded cache should discard once it holds more
//! than `max_size` of them, without locks and without a table of tracked
//! entries. The only per-entry state is the queue handle the policy stores in
//! the entry's own metadata slot.
//!
//! # How It Works
//!
//! ```text
//!   on_entry_accessed(removed = false, e)        on_entry_accessed(removed = true, e)
//!                  │                                          │
//!          e.is_cached()? ──no──▶ ignore               take e's handle
//!                  │ yes                                 unlink its node
//!                touch(e)
//!                  │ new node
//!               shrink()
//!
//!   queue (oldest ─────────────────────────────▶ newest)
//!   ┌───┐ ┌───┐ ┌───┐ ┌───┐
//!   │ A │ │ C │ │ D │ │ B │   ◀── touching B unlinked its old node
//!   └───┘ └───┘ └───┘ └───┘       and appended a fresh one
//!     ▲
//!   shrink() polls here and asks the entry to evict itself
//! ```
//!
//! The queue itself is plain FIFO. Recency comes from `touch`, which moves an
//! entry to the tail by unlinking its node and appending a new one; the oldest
//! node is therefore always the least recently used entry.
//!
//! # Touch State Machine
//!
//! 1. Read the entry's slot.
//! 2. Empty slot: append a node and put-if-absent its handle.
//!    - Another handle got there first: unlink ours, report no change.
//!    - Installed and still live: report a new node, unless the entry stopped
//!      being cached meanwhile, in which case unlink it.
//!    - Installed but already polled by a racing shrink: compare-and-remove
//!      the stale handle and start over, or give up if the slot changed.
//! 3. Occupied slot: unlink the old node. If that wins, append a new node and
//!    compare-and-replace the handle; if the replace loses, unlink the new
//!    node. If the unlink loses, the entry is being evicted or removed
//!    elsewhere and nothing is done.
//!
//! # Consistency
//!
//! - Between unlinking the old node and appending the new one, a touched entry
//!   has no live node at all. A shrink pass running in that window does not
//!   see it.
//! - When the unlink wins but the replace loses, the entry's old position is
//!   gone and its slot belongs to someone else, so it stays untracked until
//!   its next access.
//! - The queue length is an approximate counter. The cache may exceed
//!   `max_size` while threads race, and a move that raced the last shrink
//!   pass can leave it one over until the next new entry is tracked.
//! - Only a touch that tracks a new entry runs a shrink pass. Moving an
//!   entry never evicts anything, so reads stay O(1) even while the queue is
//!   over its bound with entries that refuse eviction.
//!
//! # Thread Safety
//!
//! `LruEvictionPolicy` is `Send + Sync` and is meant to be shared through an
//! `Arc` by every thread that reads or writes the cache.

use crate::config::{ConfigError, LruPolicyConfig};
use crate::entry::EvictableEntry;
use crate::meta::PolicyTag;
use crate::metrics::{CacheMetrics, LruPolicyMetrics};
use crate::policy::EvictionPolicy;
use crate::queue::OrderedQueue;
use crate::sync::Backoff;
use core::fmt;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// A lock-free LRU eviction policy.
///
/// # Examples
///
/// ```rust,ignore
/// let policy = Arc::new(LruEvictionPolicy::with_max_size(10_000)?);
///
/// // From the cache, on every read or write of an entry:
/// policy.on_entry_accessed(false, &entry);
///
/// // From the cache, whenever an entry leaves it:
/// policy.on_entry_accessed(true, &entry);
/// ```
pub struct LruEvictionPolicy<E> {
    tag: PolicyTag,
    /// Advisory bound, read once per shrink pass.
    max_size: AtomicUsize,
    queue: OrderedQueue<E>,
    metrics: LruPolicyMetrics,
}

impl<E: EvictableEntry> LruEvictionPolicy<E> {
    /// Creates a policy with the default bound of
    /// [`DEFAULT_MAX_SIZE`](crate::config::DEFAULT_MAX_SIZE) entries.
    pub fn new() -> Self {
        Self::init(LruPolicyConfig::default())
    }

    /// Creates a policy from a configuration.
    pub fn init(config: LruPolicyConfig) -> Self {
        let tag = PolicyTag::unique();
        debug!(%tag, max_size = config.max_size.get(), "created LRU eviction policy");
        LruEvictionPolicy {
            tag,
            max_size: AtomicUsize::new(config.max_size.get()),
            queue: OrderedQueue::new(),
            metrics: LruPolicyMetrics::new(),
        }
    }

    /// Creates a policy bounded to `max_size` entries.
    ///
    /// Returns [`ConfigError::InvalidMaxSize`] if `max_size` is zero.
    pub fn with_max_size(max_size: usize) -> Result<Self, ConfigError> {
        LruPolicyConfig::new(max_size).map(Self::init)
    }

    /// Returns the number of entries the cache may hold before eviction.
    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size.load(Ordering::Relaxed)
    }

    /// Changes the capacity bound.
    ///
    /// The new bound is picked up by the next shrink pass; lowering it does
    /// not evict anything by itself.
    pub fn set_max_size(&self, max_size: usize) -> Result<(), ConfigError> {
        let config = LruPolicyConfig::new(max_size)?;
        let previous = self.max_size.swap(config.max_size.get(), Ordering::Relaxed);
        debug!(tag = %self.tag, previous, max_size, "changed LRU max size");
        Ok(())
    }

    /// Returns the approximate number of entries in the queue.
    #[inline]
    pub fn current_size(&self) -> usize {
        self.queue.len()
    }

    /// Returns the tag under which this policy stores entry metadata.
    #[inline]
    pub fn tag(&self) -> PolicyTag {
        self.tag
    }

    /// Returns the tracked entries in eviction order, least recently used
    /// first.
    ///
    /// The result is a snapshot; entries touched concurrently may or may not
    /// be included.
    pub fn queue(&self) -> Vec<Arc<E>> {
        self.queue.iter().collect()
    }

    /// Returns the policy's counters.
    pub fn stats(&self) -> &LruPolicyMetrics {
        &self.metrics
    }

    /// Notifies the policy that `entry` was read or written, or, if `removed`
    /// is `true`, that it has left the cache.
    pub fn on_entry_accessed(&self, removed: bool, entry: &Arc<E>) {
        if removed {
            self.untrack(entry);
            return;
        }

        if !entry.is_cached() {
            return;
        }

        if self.touch(entry) {
            self.shrink();
        }
    }

    /// Moves `entry` to the tail of the queue, enqueuing it if untracked.
    ///
    /// Returns `true` only if a new node now represents the entry.
    fn touch(&self, entry: &Arc<E>) -> bool {
        self.metrics.record_touch();

        let Some(node) = entry.meta(self.tag) else {
            return self.enqueue(entry);
        };

        if !self.queue.unlink(&node) {
            // shrink() or a removal got to the node first.
            return false;
        }

        // Until the push below the entry has no live node.
        let moved = self.queue.push_back(Arc::clone(entry));
        if entry.replace_meta(self.tag, &node, moved.clone()) {
            self.metrics.record_move();
        } else {
            // The slot was claimed concurrently. The entry stays untracked
            // until its next access.
            self.queue.unlink(&moved);
        }

        false
    }

    fn enqueue(&self, entry: &Arc<E>) -> bool {
        let mut backoff = Backoff::new();
        loop {
            let node = self.queue.push_back(Arc::clone(entry));

            if entry.put_meta_if_absent(self.tag, node.clone()).is_some() {
                // Enqueued concurrently by another thread.
                self.queue.unlink(&node);
                return false;
            }

            if node.is_live() {
                if !entry.is_cached() {
                    // Left the cache while we were enqueuing it.
                    self.queue.unlink(&node);
                    return false;
                }
                self.metrics.record_enqueue();
                return true;
            }

            // A shrink pass polled the node before the handle was installed.
            if !entry.remove_meta(self.tag, &node) {
                return false;
            }
            backoff.spin();
        }
    }

    /// Evicts from the head until the queue fits `max_size`.
    ///
    /// Makes at most as many attempts as the queue had entries when the pass
    /// started, so a queue full of entries that refuse eviction is rotated
    /// once rather than spun on.
    fn shrink(&self) {
        let max_size = self.max_size();
        let start = self.queue.len();

        let mut evicted = 0usize;
        let mut rejected = 0usize;
        for _ in 0..start {
            if self.queue.len() <= max_size {
                break;
            }

            let Some((entry, node)) = self.queue.poll_node() else {
                break;
            };

            if entry.evict() {
                // The cache reports the removal, which clears the slot.
                evicted += 1;
                self.metrics.core.record_eviction();
            } else {
                rejected += 1;
                self.metrics.core.record_eviction_rejection();
                trace!(tag = %self.tag, "entry refused eviction, re-queued");
                entry.remove_meta(self.tag, &node);
                self.touch(&entry);
            }
        }

        self.metrics.core.record_shrink_pass();
        trace!(
            tag = %self.tag,
            max_size,
            start,
            evicted,
            rejected,
            "LRU shrink pass finished"
        );
    }

    fn untrack(&self, entry: &E) {
        let mut backoff = Backoff::new();
        while let Some(node) = entry.meta(self.tag) {
            if entry.remove_meta(self.tag, &node) {
                self.queue.unlink(&node);
                self.metrics.core.record_removal();
                return;
            }
            backoff.spin();
        }
    }
}

impl<E: EvictableEntry> Default for LruEvictionPolicy<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EvictableEntry> EvictionPolicy<E> for LruEvictionPolicy<E> {
    fn on_entry_accessed(&self, removed: bool, entry: &Arc<E>) {
        LruEvictionPolicy::on_entry_accessed(self, removed, entry);
    }

    fn max_size(&self) -> usize {
        LruEvictionPolicy::max_size(self)
    }

    fn set_max_size(&self, max_size: usize) -> Result<(), ConfigError> {
        LruEvictionPolicy::set_max_size(self, max_size)
    }

    fn current_size(&self) -> usize {
        LruEvictionPolicy::current_size(self)
    }

    fn tag(&self) -> PolicyTag {
        self.tag
    }
}

impl<E: EvictableEntry> CacheMetrics for LruEvictionPolicy<E> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.metrics.to_btreemap();
        metrics.insert("max_size".to_string(), self.max_size() as f64);
        metrics.insert("queue_size".to_string(), self.current_size() as f64);
        metrics
    }

    fn algorithm_name(&self) -> &'static str {
        "LRU"
    }
}

impl<E> fmt::Debug for LruEvictionPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruEvictionPolicy")
            .field("tag", &self.tag)
            .field("max_size", &self.max_size.load(Ordering::Relaxed))
            .field("size", &self.queue.len())
            .finish()
    }
}
