//! Heap object model

use std::fmt;
use std::rc::Rc;

use crate::engine::Engine;
use crate::host::HostObject;
use crate::value::{Handle, Value};
use crate::EngineResult;

/// Native function body: `(engine, this, args) -> result`.
pub type NativeFn = Rc<dyn Fn(&Engine, &Value, &[Value]) -> EngineResult<Value>>;

/// Insertion-ordered string-keyed property storage
#[derive(Debug, Clone, Default)]
pub struct PropertyMap {
    entries: Vec<(Rc<str>, Value)>,
}

impl PropertyMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a property value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, v)| v)
    }

    /// Set a property, keeping the original position of an existing key
    pub fn set(&mut self, key: &str, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| &**k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((Rc::from(key), value)),
        }
    }

    /// Remove a property, returning its value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| &**k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Check whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(k, _)| &**k)
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &Value> + '_ {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Function object backed by a Rust closure
#[derive(Clone)]
pub struct NativeFunction {
    /// Function name (for diagnostics and `toString`)
    pub name: Rc<str>,
    /// Function body
    pub body: NativeFn,
    /// Ordinary properties stored on the function object
    pub properties: PropertyMap,
}

/// Engine-side wrapper that owns a host object
#[derive(Clone)]
pub struct HostWrapper {
    /// The host implementation consulted before ordinary properties
    pub host: Rc<dyn HostObject>,
    /// Ordinary properties for names the host does not intercept
    pub expandos: PropertyMap,
}

/// Object stored in a heap slot
#[derive(Clone)]
pub enum HeapObject {
    /// Plain object
    Object(PropertyMap),
    /// Array; `None` entries are holes
    Array(Vec<Option<Value>>),
    /// Native function
    Function(NativeFunction),
    /// A method of a host object, bound to its wrapper
    HostMethod {
        /// Wrapper the method was read from
        target: Handle,
        /// Method name
        name: Rc<str>,
    },
    /// Host wrapper
    Host(HostWrapper),
}

impl HeapObject {
    /// Coarse classification used by value inspectors
    pub fn kind(&self) -> ObjectKind {
        match self {
            HeapObject::Object(_) => ObjectKind::Plain,
            HeapObject::Array(_) => ObjectKind::Array,
            HeapObject::Function(_) | HeapObject::HostMethod { .. } => ObjectKind::Function,
            HeapObject::Host(wrapper) => {
                if wrapper.host.is_callable() {
                    ObjectKind::Function
                } else {
                    ObjectKind::Host
                }
            }
        }
    }

    /// Visit every value this object references
    pub(crate) fn trace(&self, mut visit: impl FnMut(&Value)) {
        match self {
            HeapObject::Object(props) => props.values().for_each(visit),
            HeapObject::Array(elements) => elements.iter().flatten().for_each(visit),
            HeapObject::Function(func) => func.properties.values().for_each(visit),
            HeapObject::HostMethod { target, .. } => visit(&Value::Object(*target)),
            HeapObject::Host(wrapper) => wrapper.expandos.values().for_each(visit),
        }
    }
}

impl fmt::Debug for HeapObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapObject::Object(props) => write!(f, "Object({} props)", props.len()),
            HeapObject::Array(elements) => write!(f, "Array(len={})", elements.len()),
            HeapObject::Function(func) => write!(f, "Function({})", func.name),
            HeapObject::HostMethod { target, name } => {
                write!(f, "HostMethod({:?}.{})", target, name)
            }
            HeapObject::Host(wrapper) => {
                write!(f, "Host({} expandos)", wrapper.expandos.len())
            }
        }
    }
}

/// Classification of a heap object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Plain object
    Plain,
    /// Array
    Array,
    /// Anything callable
    Function,
    /// Non-callable host wrapper
    Host,
}
