//! Evictable Entry Contract
//!
//! The eviction policy does not own cache entries. The cache storage engine
//! hands it shared references to its own entries, and the policy reaches back
//! into the cache only through the capabilities described by
//! [`EvictableEntry`]:
//!
//! - whether the entry is still cached and may be tracked at all,
//! - an attempt to evict it, which the cache may refuse (e.g. pinned entries),
//! - a metadata slot, addressed by the policy's [`PolicyTag`], holding the
//!   [`NodeHandle`] of the queue node that currently represents the entry.
//!
//! The metadata slot is the single source of truth for whether an entry is
//! enqueued and where. All four slot operations must be atomic with respect to
//! each other; [`MetaSlot`](crate::MetaSlot) and
//! [`MetaTable`](crate::MetaTable) provide ready-made implementations.
//!
//! # Removal Notifications
//!
//! Whenever an entry leaves the cache, for whatever reason and including a
//! successful [`evict`](EvictableEntry::evict), the cache must report it with
//! `on_entry_accessed(true, entry)` so the policy can clear the slot and drop
//! the entry's node.

use crate::meta::PolicyTag;
use crate::queue::NodeHandle;

/// A cache entry that can be tracked by an eviction policy.
///
/// Implementations must be safe to call from many threads at once.
///
/// # Example
///
/// ```rust,ignore
/// impl EvictableEntry for MyEntry {
///     fn is_cached(&self) -> bool {
///         self.state.load(Ordering::Acquire) == CACHED
///     }
///
///     fn evict(&self) -> bool {
///         self.cache.try_remove(&self.key)
///     }
///
///     fn meta(&self, _tag: PolicyTag) -> Option<NodeHandle<Self>> {
///         self.slot.get()
///     }
///
///     // put_meta_if_absent, replace_meta and remove_meta delegate likewise
/// }
/// ```
pub trait EvictableEntry: Send + Sync + Sized {
    /// Returns `true` while the entry is in the cache and eligible for
    /// eviction tracking.
    fn is_cached(&self) -> bool;

    /// Attempts to remove the entry from the cache.
    ///
    /// Returns `false` if the entry cannot be evicted right now, for example
    /// because it is pinned. A refusal is not an error; the policy re-queues
    /// the entry and tries again later.
    fn evict(&self) -> bool;

    /// Returns the handle stored under `tag`, if any.
    fn meta(&self, tag: PolicyTag) -> Option<NodeHandle<Self>>;

    /// Stores `handle` under `tag` if nothing is stored there yet.
    ///
    /// Returns `None` if the handle was stored, or the handle already present.
    fn put_meta_if_absent(&self, tag: PolicyTag, handle: NodeHandle<Self>)
        -> Option<NodeHandle<Self>>;

    /// Replaces `current` with `new` under `tag`.
    ///
    /// Returns `false`, leaving the slot untouched, if `current` is not the
    /// handle stored there.
    fn replace_meta(&self, tag: PolicyTag, current: &NodeHandle<Self>, new: NodeHandle<Self>)
        -> bool;

    /// Clears the slot under `tag` if it holds `current`.
    fn remove_meta(&self, tag: PolicyTag, current: &NodeHandle<Self>) -> bool;
}
