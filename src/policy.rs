//! Eviction Policy Integration Contract
//!
//! The interface a cache storage engine drives. The engine calls
//! [`on_entry_accessed`](EvictionPolicy::on_entry_accessed) on every read and
//! write of an entry with `removed == false`, and on every removal of an entry,
//! whatever its cause, with `removed == true`. The policy reacts by reordering
//! its bookkeeping and, when the cache has grown past its bound, by asking
//! entries to [`evict`](crate::EvictableEntry::evict) themselves.
//!
//! Other ordering rules (FIFO, random, weighted) fit the same contract.

use crate::config::ConfigError;
use crate::entry::EvictableEntry;
use crate::meta::PolicyTag;
use std::sync::Arc;

/// An eviction policy over entries of type `E`.
pub trait EvictionPolicy<E: EvictableEntry>: Send + Sync {
    /// Notifies the policy that `entry` was accessed, or removed from the
    /// cache if `removed` is `true`.
    fn on_entry_accessed(&self, removed: bool, entry: &Arc<E>);

    /// Returns the number of entries the cache may hold before eviction.
    fn max_size(&self) -> usize;

    /// Changes the capacity bound. Zero is rejected and leaves the bound
    /// unchanged.
    fn set_max_size(&self, max_size: usize) -> Result<(), ConfigError>;

    /// Returns the approximate number of tracked entries.
    fn current_size(&self) -> usize;

    /// Returns the tag under which this policy stores entry metadata.
    fn tag(&self) -> PolicyTag;
}
