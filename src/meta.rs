//! Policy Tags and Per-Entry Metadata Stores
//!
//! An eviction policy never keeps a table of the entries it tracks. Instead
//! each entry carries a small metadata store, and the policy records in it the
//! [`NodeHandle`] of the queue node that currently represents the entry. The
//! store is addressed by the policy's [`PolicyTag`], so independent policies
//! can track the same entries without seeing each other's handles.
//!
//! Two stores are provided for implementing
//! [`EvictableEntry`](crate::EvictableEntry):
//!
//! | Store | Policies per entry | Synchronization |
//! |-------|--------------------|-----------------|
//! | [`MetaSlot`] | one | lock-free (`arc_swap`) |
//! | [`MetaTable`] | any | per-entry `parking_lot::Mutex` |
//!
//! Every operation is a compare-and-swap on the handle: put-if-absent,
//! compare-and-replace and compare-and-remove. These are the only
//! synchronization points between the policy and the cache that owns the
//! entries.

use crate::queue::{same_node, Node, NodeHandle};
use arc_swap::ArcSwapOption;
use core::fmt;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

static NEXT_TAG: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of one eviction policy instance.
///
/// Every call to [`PolicyTag::unique`] returns a tag that no other call in the
/// same process returns.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolicyTag(u64);

impl PolicyTag {
    /// Allocates a fresh, process-unique tag.
    pub fn unique() -> Self {
        PolicyTag(NEXT_TAG.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw tag value.
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for PolicyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PolicyTag").field(&self.0).finish()
    }
}

impl fmt::Display for PolicyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "policy-{}", self.0)
    }
}

/// A lock-free metadata slot for entries tracked by a single policy.
///
/// The slot holds at most one handle and ignores the tag, so it must not be
/// shared between policies; use [`MetaTable`] for that.
///
/// # Examples
///
/// ```
/// use lru_evict::meta::MetaSlot;
/// use lru_evict::queue::OrderedQueue;
/// use std::sync::Arc;
///
/// let queue = OrderedQueue::new();
/// let slot = MetaSlot::new();
///
/// let first = queue.push_back(Arc::new(1));
/// assert!(slot.put_if_absent(first.clone()).is_none());
///
/// let second = queue.push_back(Arc::new(1));
/// assert_eq!(slot.put_if_absent(second.clone()), Some(first.clone()));
///
/// assert!(slot.replace(&first, second.clone()));
/// assert!(!slot.remove(&first));
/// assert!(slot.remove(&second));
/// assert!(slot.get().is_none());
/// ```
pub struct MetaSlot<E> {
    slot: ArcSwapOption<Node<E>>,
}

impl<E> MetaSlot<E> {
    /// Creates an empty slot.
    pub fn new() -> Self {
        MetaSlot {
            slot: ArcSwapOption::empty(),
        }
    }

    /// Returns the stored handle, if any.
    #[inline]
    pub fn get(&self) -> Option<NodeHandle<E>> {
        self.slot.load_full().map(NodeHandle::from_node)
    }

    /// Stores `handle` if the slot is empty.
    ///
    /// Returns `None` on success, or the handle already present.
    pub fn put_if_absent(&self, handle: NodeHandle<E>) -> Option<NodeHandle<E>> {
        let empty: Option<Arc<Node<E>>> = None;
        let prev = self.slot.compare_and_swap(&empty, Some(handle.node));
        let prev: &Option<Arc<Node<E>>> = &prev;
        prev.as_ref().map(|node| NodeHandle::from_node(Arc::clone(node)))
    }

    /// Replaces `current` with `new`. Fails if the slot holds anything else.
    pub fn replace(&self, current: &NodeHandle<E>, new: NodeHandle<E>) -> bool {
        let expected = Some(Arc::clone(&current.node));
        let prev = self.slot.compare_and_swap(&expected, Some(new.node));
        same_node(&*prev, &expected)
    }

    /// Empties the slot if it holds `current`.
    pub fn remove(&self, current: &NodeHandle<E>) -> bool {
        let expected = Some(Arc::clone(&current.node));
        let prev = self.slot.compare_and_swap(&expected, None);
        same_node(&*prev, &expected)
    }
}

impl<E> Default for MetaSlot<E> {
    fn default() -> Self {
        MetaSlot::new()
    }
}

impl<E> fmt::Debug for MetaSlot<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaSlot").field("handle", &self.get()).finish()
    }
}

/// A tag-addressed metadata store for entries tracked by several policies.
///
/// This is what stacked caches need: each policy sees only the handle stored
/// under its own tag. The map is guarded by a mutex owned by the entry, so
/// contention is limited to threads touching the same entry.
pub struct MetaTable<E> {
    handles: Mutex<HashMap<PolicyTag, NodeHandle<E>>>,
}

impl<E> MetaTable<E> {
    /// Creates an empty table.
    pub fn new() -> Self {
        MetaTable {
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the handle stored under `tag`, if any.
    pub fn get(&self, tag: PolicyTag) -> Option<NodeHandle<E>> {
        self.handles.lock().get(&tag).cloned()
    }

    /// Stores `handle` under `tag` unless a handle is already present.
    ///
    /// Returns `None` on success, or the handle already present.
    pub fn put_if_absent(&self, tag: PolicyTag, handle: NodeHandle<E>) -> Option<NodeHandle<E>> {
        let mut handles = self.handles.lock();
        if let Some(existing) = handles.get(&tag) {
            return Some(existing.clone());
        }
        handles.insert(tag, handle);
        None
    }

    /// Replaces `current` under `tag` with `new`.
    pub fn replace(&self, tag: PolicyTag, current: &NodeHandle<E>, new: NodeHandle<E>) -> bool {
        let mut handles = self.handles.lock();
        match handles.get_mut(&tag) {
            Some(existing) if *existing == *current => {
                *existing = new;
                true
            }
            _ => false,
        }
    }

    /// Removes the handle under `tag` if it is `current`.
    pub fn remove(&self, tag: PolicyTag, current: &NodeHandle<E>) -> bool {
        let mut handles = self.handles.lock();
        if handles.get(&tag) == Some(current) {
            handles.remove(&tag);
            return true;
        }
        false
    }

    /// Returns the number of policies with a handle in this table.
    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    /// Returns `true` if no policy has a handle in this table.
    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }
}

impl<E> Default for MetaTable<E> {
    fn default() -> Self {
        MetaTable::new()
    }
}

impl<E> fmt::Debug for MetaTable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaTable")
            .field("policies", &self.len())
            .finish()
    }
}
