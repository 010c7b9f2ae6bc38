#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Wiring a Cache to the Policy
//!
//! ```text
//! ┌──────────────────────────────┐        on_entry_accessed(false, e)
//! │        cache storage         │ ──────────────────────────────────▶ ┌───────────────────┐
//! │                              │        on_entry_accessed(true, e)   │ LruEvictionPolicy │
//! │  get / put / remove / expire │ ──────────────────────────────────▶ │                   │
//! │                              │                                     │   OrderedQueue    │
//! │  entry.evict()  ◀────────────┼──────────────────────────────────── │   (LRU ─▶ MRU)    │
//! └──────────────────────────────┘          shrink() over bound        └───────────────────┘
//! ```
//!
//! The cache owns its entries and implements [`EvictableEntry`] for them. The
//! policy never stores entries anywhere but its queue, and keeps each entry's
//! position in the entry's own metadata under the policy's [`PolicyTag`].
//! Entries carry that metadata either in a [`MetaSlot`] (one policy) or a
//! [`MetaTable`] (several policies over the same entries).
//!
//! ## Quick Reference
//!
//! | Type | Role |
//! |------|------|
//! | [`LruEvictionPolicy`] | Lock-free LRU ordering and shrinking |
//! | [`EvictionPolicy`] | Contract a cache drives |
//! | [`EvictableEntry`] | Contract a cache entry fulfils |
//! | [`OrderedQueue`] | Concurrent FIFO with O(1) unlink by handle |
//! | [`NodeHandle`] | An entry's position in an [`OrderedQueue`] |
//! | [`MetaSlot`] / [`MetaTable`] | Per-entry metadata: one lock-free slot, or a mutex-guarded map |
//! | [`LruPolicyConfig`] | Capacity configuration |
//!
//! ## Costs
//!
//! | Operation | Cost | Allocation |
//! |-----------|------|------------|
//! | touch, new entry | O(1) amortized | one queue node |
//! | touch, tracked entry | O(1) amortized | one queue node |
//! | removal | O(1) amortized | none |
//! | shrink | O(entries over bound), at most one queue length | none |
//!
//! Unlinked nodes are left in the queue as tombstones and swept in batches, so
//! a long-lived queue holds at most a bounded multiple of its live entries.
//!
//! ## Modules
//!
//! - [`lru`]: The LRU eviction policy
//! - [`queue`]: The lock-free ordered queue the policy is built on
//! - [`entry`]: The entry contract
//! - [`meta`]: Per-entry metadata storage
//! - [`policy`]: The cache-facing policy contract
//! - [`config`]: Configuration structures
//! - [`metrics`]: Counters for monitoring policy behaviour

/// Contract between the policy and the entries it orders.
///
/// Entries report whether they are still cached, evict themselves on request,
/// and store the policy's queue handle in their metadata.
pub mod entry;

/// Per-entry metadata storage.
///
/// Provides [`PolicyTag`], the key a policy stores its handle under, plus
/// [`MetaSlot`], a lock-free slot for a single policy, and [`MetaTable`], a
/// mutex-guarded map for any number. Entries embed one of them to implement
/// the metadata half of [`EvictableEntry`].
pub mod meta;

/// Lock-free ordered queue with O(1) unlink by handle.
///
/// Internal ordering structure of the LRU policy, exposed for caches that want
/// to build other orderings on the same primitives.
pub mod queue;

/// Policy configuration structures.
pub mod config;

/// Cache-facing eviction policy contract.
pub mod policy;

/// Least Recently Used (LRU) eviction policy.
///
/// Orders entries by last access and evicts the least recently used ones when
/// the cache holds more than its configured maximum.
pub mod lru;

/// Eviction metrics.
///
/// Counters for touches, evictions, removals and shrink passes, reported in a
/// deterministic order through [`CacheMetrics`].
pub mod metrics;

mod sync;

pub use lru::LruEvictionPolicy;

pub use entry::EvictableEntry;
pub use policy::EvictionPolicy;

pub use meta::{MetaSlot, MetaTable, PolicyTag};
pub use queue::{NodeHandle, OrderedQueue};

pub use config::{ConfigError, LruPolicyConfig, DEFAULT_MAX_SIZE};
pub use metrics::{CacheMetrics, LruPolicyMetrics};
