//! Lock-Free Ordered Queue
//!
//! A concurrent FIFO sequence of shared items in which every item is wrapped in
//! a node. Appending an item returns a [`NodeHandle`] that can later be used to
//! remove exactly that node from anywhere in the queue. The queue knows nothing
//! about eviction; [`LruEvictionPolicy`](crate::LruEvictionPolicy) builds
//! recency ordering on top of it by unlinking and re-appending nodes.
//!
//! # How It Works
//!
//! ```text
//!   head (sentinel)                                        tail (hint)
//!        │                                                      │
//!        ▼                                                      ▼
//!   ┌────────┐    ┌────────┐    ┌────────┐    ┌────────┐    ┌────────┐
//!   │  --    │───▶│ item A │───▶│   --   │───▶│ item C │───▶│ item D │───▶ ∅
//!   └────────┘    └────────┘    └────────┘    └────────┘    └────────┘
//!                               tombstone
//! ```
//!
//! - The chain is singly linked from a head sentinel. New nodes are linked onto
//!   the node whose `next` is empty, Michael–Scott style, and the tail pointer is
//!   only a hint that is advanced after the fact.
//! - A node is live while its item slot is set. Removal, by [`OrderedQueue::poll`]
//!   or [`OrderedQueue::unlink`], is one atomic swap of the item slot to empty,
//!   so exactly one caller ever wins a given node.
//! - Tombstoned nodes are skipped by every traversal. `poll` moves the head past
//!   them, and once enough tombstones have accumulated an unlink sweeps the
//!   chain and splices dead interior nodes out. The sweep never splices out the
//!   last node, because that is where appends link new nodes.
//!
//! Links are `arc_swap` cells over reference-counted nodes, so a handle keeps
//! its node valid for as long as the caller holds it, whether or not the node
//! is still linked.
//!
//! # Performance Characteristics
//!
//! | Operation | Cost |
//! |-----------|------|
//! | `push_back` | O(1) amortized |
//! | `poll` | O(1) amortized |
//! | `unlink` | O(1) amortized (sweeps are paid for by the tombstones they remove) |
//! | `len` | O(1), approximate under concurrent mutation |
//!
//! # Example
//!
//! ```
//! use lru_evict::queue::OrderedQueue;
//! use std::sync::Arc;
//!
//! let queue = OrderedQueue::new();
//! let a = queue.push_back(Arc::new("a"));
//! queue.push_back(Arc::new("b"));
//!
//! assert!(queue.unlink(&a));
//! assert!(!queue.unlink(&a));
//! assert_eq!(queue.poll().as_deref(), Some(&"b"));
//! assert!(queue.poll().is_none());
//! ```

use crate::sync::Backoff;
use arc_swap::{ArcSwap, ArcSwapOption};
use core::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Minimum number of tombstones that must pile up before an unlink sweeps.
const SWEEP_THRESHOLD: usize = 32;

/// A link in the queue.
///
/// `item` is empty for the head sentinel and for every node that has been
/// removed. It is never set again once emptied.
pub(crate) struct Node<T> {
    item: ArcSwapOption<T>,
    next: ArcSwapOption<Node<T>>,
}

impl<T> Node<T> {
    fn new(item: Option<Arc<T>>) -> Self {
        Node {
            item: ArcSwapOption::new(item),
            next: ArcSwapOption::empty(),
        }
    }

    #[inline]
    fn is_live(&self) -> bool {
        self.item.load().is_some()
    }

    /// Tombstones the node. Only the first caller gets the item back.
    #[inline]
    fn take(&self) -> Option<Arc<T>> {
        self.item.swap(None)
    }
}

impl<T> Drop for Node<T> {
    fn drop(&mut self) {
        // Unroll the chain iteratively; a long run of nodes owned only by
        // their predecessor would otherwise be dropped recursively.
        let mut next = self.next.swap(None);
        while let Some(node) = next {
            match Arc::try_unwrap(node) {
                Ok(node) => next = node.next.swap(None),
                Err(_) => break,
            }
        }
    }
}

/// Pointer equality over optional node references.
#[inline]
pub(crate) fn same_node<T>(a: &Option<Arc<Node<T>>>, b: &Option<Arc<Node<T>>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// A non-owning reference to a node of an [`OrderedQueue`].
///
/// Handles compare equal only when they refer to the same node. A handle stays
/// valid after its node has been removed; it then reports [`is_live`] as
/// `false` forever and must be discarded by the caller.
///
/// [`is_live`]: NodeHandle::is_live
pub struct NodeHandle<T> {
    pub(crate) node: Arc<Node<T>>,
}

impl<T> NodeHandle<T> {
    #[inline]
    pub(crate) fn from_node(node: Arc<Node<T>>) -> Self {
        NodeHandle { node }
    }

    /// Returns `true` until the node is removed by `poll` or `unlink`.
    #[inline]
    pub fn is_live(&self) -> bool {
        self.node.is_live()
    }

    /// Returns the item held by the node, or `None` once it has been removed.
    #[inline]
    pub fn item(&self) -> Option<Arc<T>> {
        self.node.item.load_full()
    }
}

impl<T> Clone for NodeHandle<T> {
    fn clone(&self) -> Self {
        NodeHandle {
            node: Arc::clone(&self.node),
        }
    }
}

impl<T> PartialEq for NodeHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl<T> Eq for NodeHandle<T> {}

impl<T> fmt::Debug for NodeHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("node", &Arc::as_ptr(&self.node))
            .field("live", &self.is_live())
            .finish()
    }
}

/// A lock-free FIFO queue with O(1) removal of arbitrary nodes.
///
/// All operations take `&self` and may be called from any number of threads at
/// once. None of them blocks: contention is resolved by retrying a
/// compare-and-swap.
///
/// # Length
///
/// [`len`](OrderedQueue::len) is a counter maintained next to the link
/// structure rather than a count of the chain. It may be briefly off while
/// other threads are mutating the queue and settles on the exact number of
/// live items once they stop.
pub struct OrderedQueue<T> {
    /// Sentinel preceding the oldest candidate node. Its item is always empty.
    head: ArcSwap<Node<T>>,
    /// A node at or before the last node.
    tail: ArcSwap<Node<T>>,
    len: AtomicUsize,
    /// Tombstones created by `unlink` since the last sweep.
    garbage: AtomicUsize,
}

impl<T> OrderedQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        let sentinel = Arc::new(Node::new(None));
        OrderedQueue {
            head: ArcSwap::new(Arc::clone(&sentinel)),
            tail: ArcSwap::new(sentinel),
            len: AtomicUsize::new(0),
            garbage: AtomicUsize::new(0),
        }
    }

    /// Returns the approximate number of live items.
    #[inline]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Returns `true` if the approximate length is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends `item` at the tail and returns a handle to its node.
    ///
    /// The handle's [`item`](NodeHandle::item) is `item` until the node is
    /// removed.
    pub fn push_back(&self, item: Arc<T>) -> NodeHandle<T> {
        let node = Arc::new(Node::new(Some(item)));
        // Counted before the node is published, so a racing removal of this
        // very node can never take the counter below zero.
        self.len.fetch_add(1, Ordering::AcqRel);

        let empty: Option<Arc<Node<T>>> = None;
        let mut backoff = Backoff::new();
        loop {
            let tail = self.tail.load_full();
            let last = Self::last_from(&tail);
            let prev = last.next.compare_and_swap(&empty, Some(Arc::clone(&node)));
            if prev.is_none() {
                // Losing this race only means someone moved the hint further.
                let _ = self.tail.compare_and_swap(&tail, Arc::clone(&node));
                return NodeHandle::from_node(node);
            }
            backoff.spin();
        }
    }

    /// Removes and returns the oldest live item, or `None` if the queue is
    /// empty at the time of the call.
    pub fn poll(&self) -> Option<Arc<T>> {
        self.poll_node().map(|(item, _)| item)
    }

    /// Like [`poll`](OrderedQueue::poll), but also hands back the removed node.
    pub(crate) fn poll_node(&self) -> Option<(Arc<T>, NodeHandle<T>)> {
        let head = self.head.load_full();
        let mut cur = Arc::clone(&head);
        loop {
            let Some(next) = cur.next.load_full() else {
                self.advance_head(&head, cur);
                return None;
            };
            if let Some(item) = next.take() {
                self.len.fetch_sub(1, Ordering::AcqRel);
                self.advance_head(&head, Arc::clone(&next));
                return Some((item, NodeHandle::from_node(next)));
            }
            cur = next;
        }
    }

    /// Removes the node referenced by `handle`.
    ///
    /// Returns `true` if this call removed it and `false` if it had already
    /// been removed by an earlier `unlink` or `poll`. When several threads
    /// unlink the same handle at once, exactly one of them gets `true`.
    ///
    /// `handle` must have been returned by this queue.
    pub fn unlink(&self, handle: &NodeHandle<T>) -> bool {
        if handle.node.take().is_none() {
            return false;
        }
        self.len.fetch_sub(1, Ordering::AcqRel);

        let garbage = self.garbage.fetch_add(1, Ordering::AcqRel) + 1;
        if garbage > self.len().max(SWEEP_THRESHOLD)
            && self
                .garbage
                .compare_exchange(garbage, 0, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
        {
            self.sweep(garbage);
        }
        true
    }

    /// Returns an iterator over the live items from oldest to newest.
    ///
    /// The iterator is weakly consistent: it never yields an item twice and
    /// yields every item that stays in the queue for the whole iteration, but
    /// may or may not see concurrent appends and removals.
    pub fn iter(&self) -> Iter<T> {
        Iter {
            next: self.head.load().next.load_full(),
        }
    }

    fn last_from(start: &Arc<Node<T>>) -> Arc<Node<T>> {
        let mut cur = Arc::clone(start);
        while let Some(next) = cur.next.load_full() {
            cur = next;
        }
        cur
    }

    /// Moves the head from `expected` to `new`. Every node in between must
    /// already be dead.
    #[inline]
    fn advance_head(&self, expected: &Arc<Node<T>>, new: Arc<Node<T>>) {
        if !Arc::ptr_eq(expected, &new) {
            let _ = self.head.compare_and_swap(expected, new);
        }
    }

    /// Splices dead nodes out of the chain.
    ///
    /// A node is only ever replaced in its predecessor's `next` by a node that
    /// was its own successor, and only once it is dead. Every `next` pointer
    /// therefore skips nothing but dead nodes, no matter how sweeps interleave,
    /// and every live node stays reachable from the head.
    fn sweep(&self, garbage: usize) {
        let mut budget = 2 * (self.len() + garbage) + SWEEP_THRESHOLD;
        let mut removed = 0usize;
        let mut prev = self.head.load_full();
        while budget > 0 {
            budget -= 1;
            let current = prev.next.load_full();
            let Some(cur) = current.as_ref() else {
                break;
            };
            if cur.is_live() {
                prev = Arc::clone(cur);
                continue;
            }
            // The last node stays linked: appends attach to it.
            let Some(next) = cur.next.load_full() else {
                break;
            };
            let swapped = prev.next.compare_and_swap(&current, Some(next));
            if same_node(&*swapped, &current) {
                removed += 1;
            }
        }
        tracing::trace!(garbage, removed, "ordered queue swept");
    }

    /// Counts every node in the chain after the head sentinel, dead or alive.
    #[cfg(test)]
    pub(crate) fn physical_len(&self) -> usize {
        let mut count = 0;
        let mut cur = self.head.load().next.load_full();
        while let Some(node) = cur {
            count += 1;
            cur = node.next.load_full();
        }
        count
    }
}

impl<T> Default for OrderedQueue<T> {
    fn default() -> Self {
        OrderedQueue::new()
    }
}

impl<T> fmt::Debug for OrderedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderedQueue")
            .field("len", &self.len())
            .finish()
    }
}

/// Iterator over the live items of an [`OrderedQueue`], oldest first.
///
/// Created by [`OrderedQueue::iter`].
pub struct Iter<T> {
    next: Option<Arc<Node<T>>>,
}

impl<T> Iterator for Iter<T> {
    type Item = Arc<T>;

    fn next(&mut self) -> Option<Arc<T>> {
        while let Some(node) = self.next.take() {
            self.next = node.next.load_full();
            if let Some(item) = node.item.load_full() {
                return Some(item);
            }
        }
        None
    }
}

impl<T> fmt::Debug for Iter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("exhausted", &self.next.is_none())
            .finish()
    }
}
