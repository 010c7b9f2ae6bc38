use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use lru_evict::queue::OrderedQueue;
use lru_evict::{EvictableEntry, LruEvictionPolicy, MetaSlot, NodeHandle, PolicyTag};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct BenchEntry {
    cached: AtomicBool,
    slot: MetaSlot<BenchEntry>,
}

impl BenchEntry {
    fn new() -> Arc<BenchEntry> {
        Arc::new(BenchEntry {
            cached: AtomicBool::new(true),
            slot: MetaSlot::new(),
        })
    }
}

impl EvictableEntry for BenchEntry {
    fn is_cached(&self) -> bool {
        self.cached.load(Ordering::Acquire)
    }

    fn evict(&self) -> bool {
        self.cached.swap(false, Ordering::AcqRel)
    }

    fn meta(&self, _tag: PolicyTag) -> Option<NodeHandle<Self>> {
        self.slot.get()
    }

    fn put_meta_if_absent(&self, _tag: PolicyTag, handle: NodeHandle<Self>) -> Option<NodeHandle<Self>> {
        self.slot.put_if_absent(handle)
    }

    fn replace_meta(&self, _tag: PolicyTag, current: &NodeHandle<Self>, new: NodeHandle<Self>) -> bool {
        self.slot.replace(current, new)
    }

    fn remove_meta(&self, _tag: PolicyTag, current: &NodeHandle<Self>) -> bool {
        self.slot.remove(current)
    }
}

fn make_policy(max_size: usize) -> LruEvictionPolicy<BenchEntry> {
    LruEvictionPolicy::with_max_size(max_size).unwrap()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    const CACHE_SIZE: usize = 1000;
    let mut group = c.benchmark_group("Policy Operations");

    // Touches of tracked entries
    {
        let policy = make_policy(CACHE_SIZE);
        let entries: Vec<_> = (0..CACHE_SIZE).map(|_| BenchEntry::new()).collect();
        for entry in &entries {
            policy.on_entry_accessed(false, entry);
        }

        group.bench_function("LRU touch hit", |b| {
            b.iter(|| {
                for i in 0..100 {
                    policy.on_entry_accessed(false, black_box(&entries[(i * 7) % CACHE_SIZE]));
                }
            });
        });
    }

    // Inserts past the bound, one eviction each
    {
        let policy = make_policy(CACHE_SIZE);
        for _ in 0..CACHE_SIZE {
            policy.on_entry_accessed(false, &BenchEntry::new());
        }

        group.bench_function("LRU insert with eviction", |b| {
            b.iter_batched(
                || (0..100).map(|_| BenchEntry::new()).collect::<Vec<_>>(),
                |fresh| {
                    for entry in &fresh {
                        policy.on_entry_accessed(false, entry);
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    // Insert followed by a removal notification
    {
        let policy = make_policy(CACHE_SIZE);

        group.bench_function("LRU insert and remove", |b| {
            b.iter_batched(
                || (0..100).map(|_| BenchEntry::new()).collect::<Vec<_>>(),
                |fresh| {
                    for entry in &fresh {
                        policy.on_entry_accessed(false, entry);
                        policy.on_entry_accessed(true, entry);
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }

    // Raw queue operations
    {
        let queue = OrderedQueue::new();

        group.bench_function("queue push and poll", |b| {
            b.iter(|| {
                for i in 0..100 {
                    queue.push_back(Arc::new(i));
                }
                for _ in 0..100 {
                    black_box(queue.poll());
                }
            });
        });

        group.bench_function("queue push and unlink", |b| {
            b.iter(|| {
                let handles: Vec<_> = (0..100).map(|i| queue.push_back(Arc::new(i))).collect();
                for handle in handles.iter().rev() {
                    black_box(queue.unlink(handle));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
