//! Shared test harness: a minimal concurrent cache wired to one or more LRU
//! policies, following the integration rules a real cache must obey.

#![allow(dead_code)]

use lru_evict::{EvictableEntry, LruEvictionPolicy, MetaTable, NodeHandle, PolicyTag};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once, Weak};

pub type Policy = LruEvictionPolicy<TestEntry>;

static TRACING: Once = Once::new();

/// Routes policy events to the test output. Filter with `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub struct TestEntry {
    pub key: usize,
    cached: AtomicBool,
    pinned: AtomicBool,
    evictions: AtomicUsize,
    meta: MetaTable<TestEntry>,
    cache: Weak<TestCache>,
    this: Weak<TestEntry>,
}

impl TestEntry {
    /// An entry that belongs to no cache. Eviction only flips its flag.
    pub fn detached(key: usize) -> Arc<TestEntry> {
        Self::create(key, Weak::new(), false)
    }

    fn create(key: usize, cache: Weak<TestCache>, pinned: bool) -> Arc<TestEntry> {
        Arc::new_cyclic(|this| TestEntry {
            key,
            cached: AtomicBool::new(true),
            pinned: AtomicBool::new(pinned),
            evictions: AtomicUsize::new(0),
            meta: MetaTable::new(),
            cache,
            this: this.clone(),
        })
    }

    pub fn set_pinned(&self, pinned: bool) {
        self.pinned.store(pinned, Ordering::SeqCst);
    }

    pub fn evictions(&self) -> usize {
        self.evictions.load(Ordering::SeqCst)
    }

    pub fn handle(&self, tag: PolicyTag) -> Option<NodeHandle<TestEntry>> {
        self.meta.get(tag)
    }

    pub fn tracked_by(&self) -> usize {
        self.meta.len()
    }
}

impl EvictableEntry for TestEntry {
    fn is_cached(&self) -> bool {
        self.cached.load(Ordering::SeqCst)
    }

    fn evict(&self) -> bool {
        if self.pinned.load(Ordering::SeqCst) {
            return false;
        }
        if !self.cached.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.evictions.fetch_add(1, Ordering::SeqCst);
        if let (Some(cache), Some(this)) = (self.cache.upgrade(), self.this.upgrade()) {
            cache.detach(&this);
        }
        true
    }

    fn meta(&self, tag: PolicyTag) -> Option<NodeHandle<Self>> {
        self.meta.get(tag)
    }

    fn put_meta_if_absent(&self, tag: PolicyTag, handle: NodeHandle<Self>) -> Option<NodeHandle<Self>> {
        self.meta.put_if_absent(tag, handle)
    }

    fn replace_meta(&self, tag: PolicyTag, current: &NodeHandle<Self>, new: NodeHandle<Self>) -> bool {
        self.meta.replace(tag, current, new)
    }

    fn remove_meta(&self, tag: PolicyTag, current: &NodeHandle<Self>) -> bool {
        self.meta.remove(tag, current)
    }
}

/// A key-to-entry map that reports every access and removal to its policies.
pub struct TestCache {
    entries: Mutex<HashMap<usize, Arc<TestEntry>>>,
    policies: Vec<Arc<Policy>>,
}

impl TestCache {
    pub fn new(max_size: usize) -> Arc<TestCache> {
        Self::stacked(&[max_size])
    }

    /// A cache whose entries are tracked by one policy per bound.
    pub fn stacked(max_sizes: &[usize]) -> Arc<TestCache> {
        let policies = max_sizes
            .iter()
            .map(|&max_size| Arc::new(Policy::with_max_size(max_size).unwrap()))
            .collect();
        Arc::new(TestCache {
            entries: Mutex::new(HashMap::new()),
            policies,
        })
    }

    pub fn policy(&self) -> &Arc<Policy> {
        &self.policies[0]
    }

    pub fn policies(&self) -> &[Arc<Policy>] {
        &self.policies
    }

    /// Reads or inserts `key`.
    pub fn access(self: &Arc<Self>, key: usize) -> Arc<TestEntry> {
        self.access_with(key, false)
    }

    /// Inserts `key` as a pinned entry if absent, then reads it.
    pub fn access_pinned(self: &Arc<Self>, key: usize) -> Arc<TestEntry> {
        self.access_with(key, true)
    }

    fn access_with(self: &Arc<Self>, key: usize, pinned: bool) -> Arc<TestEntry> {
        let entry = {
            let mut entries = self.entries.lock();
            match entries.get(&key) {
                Some(entry) if entry.is_cached() => Arc::clone(entry),
                _ => {
                    let entry = TestEntry::create(key, Arc::downgrade(self), pinned);
                    entries.insert(key, Arc::clone(&entry));
                    entry
                }
            }
        };
        for policy in &self.policies {
            policy.on_entry_accessed(false, &entry);
        }
        entry
    }

    /// Removes `key` on behalf of the user, as opposed to eviction.
    pub fn remove(&self, key: usize) -> bool {
        let Some(entry) = self.entries.lock().remove(&key) else {
            return false;
        };
        if !entry.cached.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.notify_removed(&entry);
        true
    }

    pub fn get(&self, key: usize) -> Option<Arc<TestEntry>> {
        self.entries.lock().get(&key).cloned()
    }

    pub fn contains(&self, key: usize) -> bool {
        self.entries
            .lock()
            .get(&key)
            .map_or(false, |entry| entry.is_cached())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    fn detach(&self, entry: &Arc<TestEntry>) {
        {
            let mut entries = self.entries.lock();
            if entries
                .get(&entry.key)
                .map_or(false, |current| Arc::ptr_eq(current, entry))
            {
                entries.remove(&entry.key);
            }
        }
        self.notify_removed(entry);
    }

    fn notify_removed(&self, entry: &Arc<TestEntry>) {
        for policy in &self.policies {
            policy.on_entry_accessed(true, entry);
        }
    }
}

/// Keys in the policy's eviction order.
pub fn queue_keys(policy: &Policy) -> Vec<usize> {
    policy.queue().iter().map(|entry| entry.key).collect()
}
