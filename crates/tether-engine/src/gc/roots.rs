//! GC root tracking
//!
//! Two kinds of roots keep objects alive:
//! - Persistent roots: counted, one count per native holder (`protect` /
//!   `unprotect`). Native code that stores a value where the collector cannot
//!   see it must hold a persistent root for as long as it keeps the value.
//! - Stack roots: values pinned for the duration of an engine call.

use rustc_hash::FxHashMap;

use crate::engine::Engine;
use crate::value::{Handle, Value};

/// Root set for garbage collection
#[derive(Debug, Default)]
pub struct RootSet {
    /// Persistent roots with their protect counts
    persistent: FxHashMap<Handle, usize>,

    /// Stack roots (arguments and receivers of in-flight calls)
    stack: Vec<Value>,
}

impl RootSet {
    /// Create a new root set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one persistent root count for a value. Primitives are ignored.
    pub fn protect(&mut self, value: &Value) {
        if let Value::Object(handle) = value {
            *self.persistent.entry(*handle).or_insert(0) += 1;
        }
    }

    /// Remove one persistent root count. Returns false if the value was not
    /// protected (an unmatched unprotect).
    pub fn unprotect(&mut self, value: &Value) -> bool {
        let Value::Object(handle) = value else {
            return true;
        };
        match self.persistent.get_mut(handle) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.persistent.remove(handle);
                true
            }
            None => false,
        }
    }

    /// Current protect count of a value
    pub fn protect_count(&self, value: &Value) -> usize {
        value
            .as_handle()
            .and_then(|h| self.persistent.get(&h).copied())
            .unwrap_or(0)
    }

    /// Push stack roots; returns the previous stack height
    pub fn push_stack(&mut self, values: impl IntoIterator<Item = Value>) -> usize {
        let height = self.stack.len();
        self.stack
            .extend(values.into_iter().filter(Value::is_heap_allocated));
        height
    }

    /// Pop stack roots back to a previous height
    pub fn truncate_stack(&mut self, height: usize) {
        self.stack.truncate(height);
    }

    /// Iterate over all rooted handles
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.persistent
            .keys()
            .copied()
            .chain(self.stack.iter().filter_map(Value::as_handle))
    }

    /// Number of distinct persistently rooted objects
    pub fn persistent_len(&self) -> usize {
        self.persistent.len()
    }
}

/// Owned persistent root for one value.
///
/// Creating a `Root` protects the value, dropping it unprotects it exactly
/// once, and cloning protects it again, so the protect count always equals
/// the number of live `Root`s for that value. Replacing a root with
/// `*root = Root::new(..)` builds the new root before the old one is
/// dropped, which keeps a self-assignment rooted throughout.
pub struct Root {
    engine: Engine,
    value: Value,
}

impl Root {
    /// Protect `value` for the lifetime of the returned guard
    pub fn new(engine: &Engine, value: Value) -> Self {
        engine.protect(&value);
        Self {
            engine: engine.clone(),
            value,
        }
    }

    /// The rooted value
    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The engine the value belongs to
    #[inline]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

impl Clone for Root {
    fn clone(&self) -> Self {
        Root::new(&self.engine, self.value.clone())
    }
}

impl Drop for Root {
    fn drop(&mut self) {
        self.engine.unprotect(&self.value);
    }
}

impl std::fmt::Debug for Root {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Root").field(&self.value).finish()
    }
}
