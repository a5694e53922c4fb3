//! Mark-sweep collection over the slot heap

use std::time::{Duration, Instant};

use super::heap::Heap;
use super::roots::RootSet;
use crate::object::HeapObject;
use crate::value::Handle;

/// Garbage collector statistics
#[derive(Debug, Clone, Default)]
pub struct GcStats {
    /// Total number of collections
    pub collections: usize,

    /// Total objects freed
    pub objects_freed: usize,

    /// Total pause time across all collections
    pub total_pause_time: Duration,

    /// Last collection duration
    pub last_pause_time: Duration,

    /// Objects marked in last collection
    pub last_marked_count: usize,

    /// Objects freed in last collection
    pub last_freed_count: usize,

    /// Live objects after last collection
    pub live_objects: usize,
}

impl GcStats {
    fn update(&mut self, pause: Duration, marked: usize, freed: usize, live: usize) {
        self.collections += 1;
        self.objects_freed += freed;
        self.total_pause_time += pause;
        self.last_pause_time = pause;
        self.last_marked_count = marked;
        self.last_freed_count = freed;
        self.live_objects = live;
    }
}

/// Run one full collection.
///
/// Returns the swept objects; the caller drops them once it no longer
/// borrows the heap, since host wrappers may run arbitrary drop glue.
pub(crate) fn collect(heap: &mut Heap, roots: &RootSet, stats: &mut GcStats) -> Vec<HeapObject> {
    let start = Instant::now();

    heap.unmark_all();
    let marked = mark(heap, roots.handles());
    let freed = heap.sweep();

    stats.update(start.elapsed(), marked, freed.len(), heap.live_count());
    freed
}

/// Mark everything reachable from `roots`; returns the number of objects marked
fn mark(heap: &mut Heap, roots: impl Iterator<Item = Handle>) -> usize {
    let mut worklist: Vec<Handle> = roots.collect();
    let mut marked = 0;

    while let Some(handle) = worklist.pop() {
        if !heap.mark(handle) {
            continue;
        }
        marked += 1;
        if let Ok(object) = heap.get(handle) {
            object.trace(|value| {
                if let Some(child) = value.as_handle() {
                    worklist.push(child);
                }
            });
        }
    }

    marked
}
