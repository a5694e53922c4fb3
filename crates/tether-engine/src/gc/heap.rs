//! Slot-table heap for GC-managed objects
//!
//! Objects live in a `Vec` of slots. Handles store the slot index and the
//! slot's generation at allocation time, which keeps handles stable across
//! `Vec` reallocation and lets stale handles be detected once a slot is
//! swept and reused.

use crate::object::HeapObject;
use crate::value::Handle;
use crate::{EngineError, EngineResult};

struct Slot {
    generation: u32,
    marked: bool,
    object: Option<HeapObject>,
}

/// Heap allocator for GC-managed objects
pub struct Heap {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    live: usize,
    /// Allocations since the last collection
    allocated_since_gc: usize,
    /// Maximum live objects (0 = unlimited)
    max_objects: usize,
}

impl Heap {
    /// Create an empty heap
    pub fn new(max_objects: usize) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
            allocated_since_gc: 0,
            max_objects,
        }
    }

    /// Allocate an object and return its handle
    pub fn allocate(&mut self, object: HeapObject) -> EngineResult<Handle> {
        if self.max_objects > 0 && self.live >= self.max_objects {
            return Err(EngineError::HeapLimitExceeded(self.max_objects));
        }

        let handle = match self.free_list.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.object = Some(object);
                slot.marked = false;
                Handle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = u32::try_from(self.slots.len())
                    .map_err(|_| EngineError::HeapLimitExceeded(u32::MAX as usize))?;
                self.slots.push(Slot {
                    generation: 0,
                    marked: false,
                    object: Some(object),
                });
                Handle {
                    index,
                    generation: 0,
                }
            }
        };

        self.live += 1;
        self.allocated_since_gc += 1;
        Ok(handle)
    }

    fn slot(&self, handle: Handle) -> Option<&Slot> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.object.is_some())
    }

    /// Check whether a handle still refers to a live object
    pub fn is_live(&self, handle: Handle) -> bool {
        self.slot(handle).is_some()
    }

    /// Borrow an object
    pub fn get(&self, handle: Handle) -> EngineResult<&HeapObject> {
        self.slot(handle)
            .and_then(|slot| slot.object.as_ref())
            .ok_or(EngineError::StaleHandle(handle))
    }

    /// Mutably borrow an object
    pub fn get_mut(&mut self, handle: Handle) -> EngineResult<&mut HeapObject> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.object.as_mut())
            .ok_or(EngineError::StaleHandle(handle))
    }

    /// Number of live objects
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Allocations since the last collection
    pub fn allocated_since_gc(&self) -> usize {
        self.allocated_since_gc
    }

    /// Clear all mark bits
    pub(crate) fn unmark_all(&mut self) {
        for slot in &mut self.slots {
            slot.marked = false;
        }
    }

    /// Mark a live object; returns false if it was already marked or is stale
    pub(crate) fn mark(&mut self, handle: Handle) -> bool {
        match self.slots.get_mut(handle.index as usize) {
            Some(slot)
                if slot.generation == handle.generation
                    && slot.object.is_some()
                    && !slot.marked =>
            {
                slot.marked = true;
                true
            }
            _ => false,
        }
    }

    /// Free every unmarked object; returns the freed objects so their drop
    /// glue runs after the heap borrow is released
    pub(crate) fn sweep(&mut self) -> Vec<HeapObject> {
        let mut freed = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.object.is_some() && !slot.marked {
                if let Some(object) = slot.object.take() {
                    freed.push(object);
                }
                slot.generation = slot.generation.wrapping_add(1);
                self.free_list.push(index as u32);
            }
        }
        self.live -= freed.len();
        self.allocated_since_gc = 0;
        freed
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::PropertyMap;

    fn plain() -> HeapObject {
        HeapObject::Object(PropertyMap::new())
    }

    #[test]
    fn test_allocate_and_get() {
        let mut heap = Heap::default();
        let h = heap.allocate(plain()).unwrap();
        assert!(heap.is_live(h));
        assert!(matches!(heap.get(h).unwrap(), HeapObject::Object(_)));
        assert_eq!(heap.live_count(), 1);
    }

    #[test]
    fn test_sweep_invalidates_handle() {
        let mut heap = Heap::default();
        let h = heap.allocate(plain()).unwrap();
        heap.unmark_all();
        let freed = heap.sweep();
        assert_eq!(freed.len(), 1);
        assert!(!heap.is_live(h));
        assert!(matches!(heap.get(h), Err(EngineError::StaleHandle(_))));
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let mut heap = Heap::default();
        let old = heap.allocate(plain()).unwrap();
        heap.unmark_all();
        heap.sweep();

        let new = heap.allocate(plain()).unwrap();
        assert_eq!(old.index(), new.index());
        assert_ne!(old.generation(), new.generation());
        assert!(!heap.is_live(old));
        assert!(heap.is_live(new));
    }

    #[test]
    fn test_marked_objects_survive() {
        let mut heap = Heap::default();
        let keep = heap.allocate(plain()).unwrap();
        let drop = heap.allocate(plain()).unwrap();
        heap.unmark_all();
        assert!(heap.mark(keep));
        assert!(!heap.mark(keep));
        heap.sweep();
        assert!(heap.is_live(keep));
        assert!(!heap.is_live(drop));
    }

    #[test]
    fn test_heap_limit() {
        let mut heap = Heap::new(1);
        heap.allocate(plain()).unwrap();
        assert!(matches!(
            heap.allocate(plain()),
            Err(EngineError::HeapLimitExceeded(1))
        ));
    }
}
