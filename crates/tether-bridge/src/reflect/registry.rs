//! Class registry for bound objects

use std::rc::{Rc, Weak};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tether_sdk::{bound_identity, BoundObject};
use tracing::debug;

use super::class::ReflectedClass;

/// Maps bound-object identity to its reflected class.
///
/// Identity is the bound object's address. Each entry also holds a weak
/// reference to its object: the allocation stays reserved while the entry
/// exists, and an entry whose object has died is never handed out again.
/// Classes of live objects are never evicted one by one;
/// [`finalize`](Self::finalize) drops all of them at once and a lookup after
/// that starts a fresh map.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: RwLock<FxHashMap<usize, Entry>>,
}

#[derive(Debug)]
struct Entry {
    object: Weak<dyn BoundObject>,
    class: Arc<ReflectedClass>,
}

impl Entry {
    fn new(obj: &Rc<dyn BoundObject>) -> Self {
        Self {
            object: Rc::downgrade(obj),
            class: Arc::new(ReflectedClass::new()),
        }
    }

    fn is_live(&self) -> bool {
        self.object.strong_count() > 0
    }
}

impl ClassRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with room for `capacity` classes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            classes: RwLock::new(FxHashMap::with_capacity_and_hasher(
                capacity,
                Default::default(),
            )),
        }
    }

    /// The class for `obj`, created on first use
    pub fn class_for_object(&self, obj: &Rc<dyn BoundObject>) -> Arc<ReflectedClass> {
        let id = bound_identity(obj);
        if let Some(entry) = self.classes.read().get(&id).filter(|entry| entry.is_live()) {
            return Arc::clone(&entry.class);
        }

        let mut classes = self.classes.write();
        if let Some(entry) = classes.get(&id).filter(|entry| entry.is_live()) {
            return Arc::clone(&entry.class);
        }
        if classes.len() == classes.capacity() {
            let before = classes.len();
            classes.retain(|_, entry| entry.is_live());
            if classes.len() < before {
                debug!(purged = before - classes.len(), "dropped classes of dead objects");
            }
        }
        debug!(id, "registering reflected class");
        let entry = Entry::new(obj);
        let class = Arc::clone(&entry.class);
        classes.insert(id, entry);
        class
    }

    /// Drop every class and its cached descriptors
    pub fn finalize(&self) {
        let mut classes = self.classes.write();
        debug!(classes = classes.len(), "finalizing class registry");
        classes.clear();
        classes.shrink_to_fit();
    }

    /// Number of registered classes, including any not yet purged
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// Check if no class is registered
    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }
}
