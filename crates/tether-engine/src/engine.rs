//! Engine context
//!
//! [`Engine`] is the execution-context handle every native holder carries.
//! It owns the heap, the root set, the exclusivity lock and the list of
//! exceptions reported through the error path.
//!
//! Heap borrows are never held across a call into a host object or a native
//! function, so hosts may freely re-enter the engine.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::defaults::{
    DEFAULT_GC_THRESHOLD, DEFAULT_MAX_HEAP_OBJECTS, MAX_ARRAY_LENGTH, MAX_CONVERSION_DEPTH,
};
use crate::gc::{self, GcStats, Heap, Root, RootSet};
use crate::host::HostObject;
use crate::lock::{DropAllLocks, EngineLock, LockState};
use crate::object::{HeapObject, HostWrapper, NativeFn, NativeFunction, ObjectKind, PropertyMap};
use crate::value::{Handle, PreferredType, Value};
use crate::{EngineError, EngineResult};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Allocations between collections triggered by [`Engine::safepoint`]
    /// (0 = never collect at safepoints)
    pub gc_threshold: usize,

    /// Maximum number of live heap objects (0 = unlimited)
    pub max_heap_objects: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            gc_threshold: DEFAULT_GC_THRESHOLD,
            max_heap_objects: DEFAULT_MAX_HEAP_OBJECTS,
        }
    }
}

impl EngineOptions {
    /// Options with a heap object limit
    pub fn with_heap_limit(max_heap_objects: usize) -> Self {
        Self {
            max_heap_objects,
            ..Default::default()
        }
    }

    /// Options with a specific safepoint threshold
    pub fn with_gc_threshold(gc_threshold: usize) -> Self {
        Self {
            gc_threshold,
            ..Default::default()
        }
    }
}

struct EngineInner {
    options: EngineOptions,
    heap: RefCell<Heap>,
    roots: RefCell<RootSet>,
    stats: RefCell<GcStats>,
    lock: LockState,
    reported: RefCell<Vec<String>>,
}

/// Handle to one engine instance (cheap to clone)
#[derive(Clone)]
pub struct Engine {
    inner: Rc<EngineInner>,
}

/// Pops call-scoped stack roots on drop
struct StackScope<'a> {
    engine: &'a Engine,
    height: usize,
}

impl Drop for StackScope<'_> {
    fn drop(&mut self) {
        self.engine.inner.roots.borrow_mut().truncate_stack(self.height);
    }
}

/// What a property read resolved to while the heap was borrowed
enum Lookup {
    Value(Value),
    Host(Rc<dyn HostObject>),
}

/// What a call resolved to while the heap was borrowed
enum CallTarget {
    Native(NativeFn),
    HostMethod(Handle, Rc<str>),
    Host(Rc<dyn HostObject>),
    NotCallable,
}

impl Engine {
    /// Create a new engine
    pub fn new(options: EngineOptions) -> Self {
        let heap = Heap::new(options.max_heap_objects);
        Self {
            inner: Rc::new(EngineInner {
                options,
                heap: RefCell::new(heap),
                roots: RefCell::new(RootSet::new()),
                stats: RefCell::new(GcStats::default()),
                lock: LockState::default(),
                reported: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Engine configuration
    pub fn options(&self) -> &EngineOptions {
        &self.inner.options
    }

    /// Whether two handles refer to the same engine
    pub fn ptr_eq(&self, other: &Engine) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ========================================================================
    // Exclusivity lock
    // ========================================================================

    /// Take one level of the exclusivity lock
    pub fn lock(&self) -> EngineLock<'_> {
        self.inner.lock.lock()
    }

    /// Release the exclusivity lock entirely until the guard is dropped
    pub fn drop_all_locks(&self) -> DropAllLocks<'_> {
        self.inner.lock.drop_all()
    }

    /// Whether the exclusivity lock is currently held
    pub fn is_locked(&self) -> bool {
        self.inner.lock.is_held()
    }

    /// Current lock depth
    pub fn lock_depth(&self) -> u32 {
        self.inner.lock.depth()
    }

    // ========================================================================
    // Rooting and collection
    // ========================================================================

    /// Add one persistent root count for `value`
    pub fn protect(&self, value: &Value) {
        if value.is_heap_allocated() {
            trace!(?value, "protect");
            self.inner.roots.borrow_mut().protect(value);
        }
    }

    /// Remove one persistent root count for `value`
    pub fn unprotect(&self, value: &Value) {
        if value.is_heap_allocated() {
            trace!(?value, "unprotect");
            if !self.inner.roots.borrow_mut().unprotect(value) {
                warn!(?value, "unprotect without matching protect");
            }
        }
    }

    /// Current persistent root count of `value`
    pub fn protect_count(&self, value: &Value) -> usize {
        self.inner.roots.borrow().protect_count(value)
    }

    /// Root `value` for the lifetime of the returned guard
    pub fn root(&self, value: Value) -> Root {
        Root::new(self, value)
    }

    fn stack_scope(&self, values: impl IntoIterator<Item = Value>) -> StackScope<'_> {
        let height = self.inner.roots.borrow_mut().push_stack(values);
        StackScope {
            engine: self,
            height,
        }
    }

    /// Run a full collection
    pub fn collect(&self) -> GcStats {
        let freed = {
            let mut heap = self.inner.heap.borrow_mut();
            let roots = self.inner.roots.borrow();
            let mut stats = self.inner.stats.borrow_mut();
            gc::collect(&mut heap, &roots, &mut stats)
        };
        let stats = self.gc_stats();
        debug!(
            marked = stats.last_marked_count,
            freed = stats.last_freed_count,
            live = stats.live_objects,
            "gc cycle finished"
        );
        // Host drop glue may re-enter the engine; every borrow is released here
        drop(freed);
        stats
    }

    /// Collect if enough allocations happened since the last collection.
    ///
    /// Only call this where every value held by native code is rooted.
    pub fn safepoint(&self) -> bool {
        let threshold = self.inner.options.gc_threshold;
        if threshold == 0 || self.inner.heap.borrow().allocated_since_gc() < threshold {
            return false;
        }
        self.collect();
        true
    }

    /// Collector statistics
    pub fn gc_stats(&self) -> GcStats {
        self.inner.stats.borrow().clone()
    }

    /// Number of live heap objects
    pub fn live_objects(&self) -> usize {
        self.inner.heap.borrow().live_count()
    }

    /// Whether `value` is a primitive or a live heap object
    pub fn is_alive(&self, value: &Value) -> bool {
        match value {
            Value::Object(handle) => self.inner.heap.borrow().is_live(*handle),
            _ => true,
        }
    }

    // ========================================================================
    // Construction
    // ========================================================================

    fn allocate(&self, object: HeapObject) -> EngineResult<Value> {
        let handle = self.inner.heap.borrow_mut().allocate(object)?;
        Ok(Value::Object(handle))
    }

    /// Create an empty plain object
    pub fn create_object(&self) -> EngineResult<Value> {
        self.allocate(HeapObject::Object(PropertyMap::new()))
    }

    /// Create an array of `len` holes
    pub fn create_array(&self, len: usize) -> EngineResult<Value> {
        let len = check_array_length(len)?;
        self.allocate(HeapObject::Array(vec![None; len]))
    }

    /// Create an array holding `items`
    pub fn create_array_from(&self, items: &[Value]) -> EngineResult<Value> {
        self.allocate(HeapObject::Array(
            items.iter().cloned().map(Some).collect(),
        ))
    }

    /// Create a native function
    pub fn create_function<F>(&self, name: &str, body: F) -> EngineResult<Value>
    where
        F: Fn(&Engine, &Value, &[Value]) -> EngineResult<Value> + 'static,
    {
        self.allocate(HeapObject::Function(NativeFunction {
            name: Rc::from(name),
            body: Rc::new(body),
            properties: PropertyMap::new(),
        }))
    }

    /// Create a host wrapper around `host`
    pub fn create_host_object(&self, host: Rc<dyn HostObject>) -> EngineResult<Value> {
        self.allocate(HeapObject::Host(HostWrapper {
            host,
            expandos: PropertyMap::new(),
        }))
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Classify a heap value; `None` for primitives and stale handles
    pub fn object_kind(&self, value: &Value) -> Option<ObjectKind> {
        let handle = value.as_handle()?;
        let heap = self.inner.heap.borrow();
        heap.get(handle).ok().map(HeapObject::kind)
    }

    /// The host behind a host wrapper
    pub fn host_object(&self, value: &Value) -> Option<Rc<dyn HostObject>> {
        let handle = value.as_handle()?;
        let heap = self.inner.heap.borrow();
        match heap.get(handle).ok()? {
            HeapObject::Host(wrapper) => Some(Rc::clone(&wrapper.host)),
            _ => None,
        }
    }

    fn expect_handle(&self, value: &Value) -> EngineResult<Handle> {
        value
            .as_handle()
            .ok_or_else(|| EngineError::TypeError(format!("{} is not an object", value.type_name())))
    }

    fn with_array<R>(
        &self,
        value: &Value,
        f: impl FnOnce(&mut Vec<Option<Value>>) -> R,
    ) -> EngineResult<R> {
        let handle = self.expect_handle(value)?;
        let mut heap = self.inner.heap.borrow_mut();
        match heap.get_mut(handle)? {
            HeapObject::Array(elements) => Ok(f(elements)),
            other => Err(EngineError::TypeError(format!("{:?} is not an array", other))),
        }
    }

    // ========================================================================
    // Arrays
    // ========================================================================

    /// Array length
    pub fn array_length(&self, array: &Value) -> EngineResult<usize> {
        self.with_array(array, |elements| elements.len())
    }

    /// Element at `index`; holes and out-of-range reads are `undefined`
    pub fn array_get(&self, array: &Value, index: usize) -> EngineResult<Value> {
        self.with_array(array, |elements| {
            elements.get(index).cloned().flatten().unwrap_or_default()
        })
    }

    /// Store at `index`, growing the array with holes when needed
    pub fn array_set(&self, array: &Value, index: usize, value: Value) -> EngineResult<()> {
        self.with_array(array, |elements| set_array_element(elements, index, value))?
    }

    /// Append; returns the new length
    pub fn array_push(&self, array: &Value, value: Value) -> EngineResult<usize> {
        self.with_array(array, |elements| {
            elements.push(Some(value));
            elements.len()
        })
    }

    /// Remove the last element; `undefined` for an empty array or a hole
    pub fn array_pop(&self, array: &Value) -> EngineResult<Value> {
        self.with_array(array, |elements| {
            elements.pop().flatten().unwrap_or_default()
        })
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Read `name` from an object.
    ///
    /// For host wrappers the host is asked first, then host methods are
    /// materialized as callable method objects, then ordinary properties on
    /// the wrapper are consulted.
    pub fn get(&self, target: &Value, name: &str) -> EngineResult<Value> {
        let _lock = self.lock();
        let handle = self.expect_handle(target)?;

        let lookup = {
            let heap = self.inner.heap.borrow();
            match heap.get(handle)? {
                HeapObject::Object(props) => Lookup::Value(props.get(name).cloned().unwrap_or_default()),
                HeapObject::Array(elements) => Lookup::Value(array_property(elements, name)),
                HeapObject::Function(func) => Lookup::Value(match name {
                    "name" => Value::String(Rc::clone(&func.name)),
                    _ => func.properties.get(name).cloned().unwrap_or_default(),
                }),
                HeapObject::HostMethod { name: method, .. } => Lookup::Value(match name {
                    "name" => Value::String(Rc::clone(method)),
                    _ => Value::Undefined,
                }),
                HeapObject::Host(wrapper) => Lookup::Host(Rc::clone(&wrapper.host)),
            }
        };

        let host = match lookup {
            Lookup::Value(value) => return Ok(value),
            Lookup::Host(host) => host,
        };

        let _scope = self.stack_scope([target.clone()]);
        if let Some(value) = host.get_property(self, name)? {
            return Ok(value);
        }
        if host.has_method(self, name) {
            return self.allocate(HeapObject::HostMethod {
                target: handle,
                name: Rc::from(name),
            });
        }

        let heap = self.inner.heap.borrow();
        match heap.get(handle)? {
            HeapObject::Host(wrapper) => Ok(wrapper.expandos.get(name).cloned().unwrap_or_default()),
            _ => Ok(Value::Undefined),
        }
    }

    /// Write `name` on an object.
    ///
    /// Arrays accept index keys and `length`; host wrappers store names the
    /// host does not intercept as ordinary properties.
    pub fn set(&self, target: &Value, name: &str, value: Value) -> EngineResult<()> {
        let _lock = self.lock();
        let handle = self.expect_handle(target)?;

        let host = {
            let mut heap = self.inner.heap.borrow_mut();
            match heap.get_mut(handle)? {
                HeapObject::Object(props) => {
                    props.set(name, value);
                    return Ok(());
                }
                HeapObject::Array(elements) => return set_array_property(elements, name, value),
                HeapObject::Function(func) => {
                    func.properties.set(name, value);
                    return Ok(());
                }
                HeapObject::HostMethod { .. } => {
                    return Err(EngineError::TypeError(format!(
                        "cannot set '{}' on a host method",
                        name
                    )))
                }
                HeapObject::Host(wrapper) => Rc::clone(&wrapper.host),
            }
        };

        let _scope = self.stack_scope([target.clone(), value.clone()]);
        if host.set_property(self, name, &value)? {
            return Ok(());
        }

        let mut heap = self.inner.heap.borrow_mut();
        if let HeapObject::Host(wrapper) = heap.get_mut(handle)? {
            wrapper.expandos.set(name, value);
        }
        Ok(())
    }

    /// Own enumerable property names, in engine order
    pub fn own_property_names(&self, target: &Value) -> EngineResult<Vec<String>> {
        let _lock = self.lock();
        let handle = self.expect_handle(target)?;

        let host = {
            let heap = self.inner.heap.borrow();
            match heap.get(handle)? {
                HeapObject::Object(props) => return Ok(props.keys().map(str::to_string).collect()),
                HeapObject::Array(elements) => {
                    return Ok(elements
                        .iter()
                        .enumerate()
                        .filter(|(_, e)| e.is_some())
                        .map(|(i, _)| i.to_string())
                        .collect())
                }
                HeapObject::Function(func) => {
                    return Ok(func.properties.keys().map(str::to_string).collect())
                }
                HeapObject::HostMethod { .. } => return Ok(Vec::new()),
                HeapObject::Host(wrapper) => Rc::clone(&wrapper.host),
            }
        };

        let _scope = self.stack_scope([target.clone()]);
        let mut names = host.own_property_names(self);

        let heap = self.inner.heap.borrow();
        if let HeapObject::Host(wrapper) = heap.get(handle)? {
            for key in wrapper.expandos.keys() {
                if !names.iter().any(|n| n == key) {
                    names.push(key.to_string());
                }
            }
        }
        Ok(names)
    }

    // ========================================================================
    // Calls and conversion
    // ========================================================================

    /// Call `callee` with receiver `this`.
    ///
    /// A thrown exception comes back as `Err(EngineError::Exception(_))`.
    pub fn call(&self, callee: &Value, this: &Value, args: &[Value]) -> EngineResult<Value> {
        let _lock = self.lock();
        let _scope = self.stack_scope(
            [callee.clone(), this.clone()]
                .into_iter()
                .chain(args.iter().cloned()),
        );

        let target = match callee.as_handle() {
            Some(handle) => {
                let heap = self.inner.heap.borrow();
                match heap.get(handle)? {
                    HeapObject::Function(func) => CallTarget::Native(Rc::clone(&func.body)),
                    HeapObject::HostMethod { target, name } => {
                        CallTarget::HostMethod(*target, Rc::clone(name))
                    }
                    HeapObject::Host(wrapper) if wrapper.host.is_callable() => {
                        CallTarget::Host(Rc::clone(&wrapper.host))
                    }
                    _ => CallTarget::NotCallable,
                }
            }
            None => CallTarget::NotCallable,
        };

        match target {
            CallTarget::Native(body) => body(self, this, args),
            CallTarget::HostMethod(wrapper, name) => {
                let host = self
                    .host_object(&Value::Object(wrapper))
                    .ok_or(EngineError::StaleHandle(wrapper))?;
                host.invoke_method(self, &name, args)
            }
            CallTarget::Host(host) => host.call(self, args),
            CallTarget::NotCallable => {
                Err(self.throw_type_error(&format!("{} is not a function", callee.type_name())))
            }
        }
    }

    /// Convert to a primitive value
    pub fn to_primitive(&self, value: &Value, hint: PreferredType) -> EngineResult<Value> {
        if !value.is_heap_allocated() {
            return Ok(value.clone());
        }
        let _lock = self.lock();
        if let Some(host) = self.host_object(value) {
            let _scope = self.stack_scope([value.clone()]);
            return host.to_primitive(self, hint);
        }
        match hint {
            PreferredType::Number => Ok(Value::Number(f64::NAN)),
            _ => Ok(Value::string(&self.to_display_string(value))),
        }
    }

    /// Human-readable string form (`String(value)`)
    pub fn to_display_string(&self, value: &Value) -> String {
        self.display_string(value, 0)
    }

    fn display_string(&self, value: &Value, depth: usize) -> String {
        match value {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.to_string(),
            Value::Object(handle) => {
                if depth >= MAX_CONVERSION_DEPTH {
                    return String::new();
                }
                let elements = {
                    let heap = self.inner.heap.borrow();
                    match heap.get(*handle) {
                        Ok(HeapObject::Array(elements)) => elements.clone(),
                        Ok(HeapObject::Object(_)) => return "[object Object]".to_string(),
                        Ok(HeapObject::Function(func)) => {
                            return format!("function {}() {{ [native code] }}", func.name)
                        }
                        Ok(HeapObject::HostMethod { name, .. }) => {
                            return format!("function {}() {{ [native code] }}", name)
                        }
                        Ok(HeapObject::Host(_)) => Vec::new(),
                        Err(_) => return "[stale object]".to_string(),
                    }
                };
                if let Some(host) = self.host_object(value) {
                    return match host.to_primitive(self, PreferredType::String) {
                        Ok(primitive) if !primitive.is_heap_allocated() => {
                            self.display_string(&primitive, depth + 1)
                        }
                        _ => "[object Host]".to_string(),
                    };
                }
                elements
                    .iter()
                    .map(|e| match e {
                        None | Some(Value::Undefined) | Some(Value::Null) => String::new(),
                        Some(v) => self.display_string(v, depth + 1),
                    })
                    .collect::<Vec<_>>()
                    .join(",")
            }
        }
    }

    // ========================================================================
    // Exceptions
    // ========================================================================

    fn make_error(&self, name: &str, message: &str) -> EngineError {
        let mut props = PropertyMap::new();
        props.set("name", Value::string(name));
        props.set("message", Value::string(message));
        match self.allocate(HeapObject::Object(props)) {
            Ok(error) => EngineError::Exception(error),
            Err(alloc_error) => alloc_error,
        }
    }

    /// Build a thrown `Error` carrying `message`
    pub fn throw_error(&self, message: &str) -> EngineError {
        self.make_error("Error", message)
    }

    /// Build a thrown `TypeError` carrying `message`
    pub fn throw_type_error(&self, message: &str) -> EngineError {
        self.make_error("TypeError", message)
    }

    /// Describe an error the way an uncaught-exception report would
    pub fn describe_error(&self, error: &EngineError) -> String {
        let EngineError::Exception(thrown) = error else {
            return error.to_string();
        };
        if let Some(handle) = thrown.as_handle() {
            let heap = self.inner.heap.borrow();
            if let Ok(HeapObject::Object(props)) = heap.get(handle) {
                if let Some(Value::String(message)) = props.get("message") {
                    let name = props
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("Error");
                    return format!("{}: {}", name, message);
                }
            }
        }
        format!("Uncaught {}", self.to_display_string(thrown))
    }

    /// Report an exception through the engine's error path
    pub fn report_exception(&self, error: &EngineError) {
        let description = self.describe_error(error);
        warn!(error = %description, "uncaught script exception");
        self.inner.reported.borrow_mut().push(description);
    }

    /// Drain the descriptions of every reported exception
    pub fn take_reported_exceptions(&self) -> Vec<String> {
        std::mem::take(&mut *self.inner.reported.borrow_mut())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("live_objects", &self.live_objects())
            .field("lock_depth", &self.lock_depth())
            .finish()
    }
}

fn array_property(elements: &[Option<Value>], name: &str) -> Value {
    if name == "length" {
        return Value::Number(elements.len() as f64);
    }
    parse_array_index(name)
        .and_then(|index| elements.get(index).cloned().flatten())
        .unwrap_or_default()
}

fn set_array_property(elements: &mut Vec<Option<Value>>, name: &str, value: Value) -> EngineResult<()> {
    if name == "length" {
        let len = value
            .as_number()
            .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= MAX_ARRAY_LENGTH as f64)
            .ok_or_else(|| EngineError::TypeError("invalid array length".to_string()))?;
        elements.resize(len as usize, None);
        return Ok(());
    }
    let index = parse_array_index(name).ok_or_else(|| {
        EngineError::TypeError(format!("arrays only accept index keys, got '{}'", name))
    })?;
    set_array_element(elements, index, value)
}

/// Canonical index keys only: `"1"` is an index, `"01"` and `"+1"` are not
fn parse_array_index(name: &str) -> Option<usize> {
    name.parse::<usize>()
        .ok()
        .filter(|index| *index < MAX_ARRAY_LENGTH && index.to_string() == name)
}

fn check_array_length(len: usize) -> EngineResult<usize> {
    if len > MAX_ARRAY_LENGTH {
        return Err(EngineError::TypeError(format!("invalid array length {}", len)));
    }
    Ok(len)
}

fn set_array_element(elements: &mut Vec<Option<Value>>, index: usize, value: Value) -> EngineResult<()> {
    if index >= elements.len() {
        let len = index
            .checked_add(1)
            .filter(|len| *len <= MAX_ARRAY_LENGTH)
            .ok_or_else(|| EngineError::TypeError(format!("array index {} out of range", index)))?;
        elements.resize(len, None);
    }
    elements[index] = Some(value);
    Ok(())
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_properties() {
        let engine = Engine::default();
        let obj = engine.create_object().unwrap();
        engine.set(&obj, "x", Value::from(5)).unwrap();
        assert_eq!(engine.get(&obj, "x").unwrap(), Value::Number(5.0));
        assert_eq!(engine.get(&obj, "missing").unwrap(), Value::Undefined);
        assert_eq!(engine.own_property_names(&obj).unwrap(), vec!["x"]);
    }

    #[test]
    fn test_array_holes_and_growth() {
        let engine = Engine::default();
        let arr = engine.create_array(2).unwrap();
        assert_eq!(engine.array_length(&arr).unwrap(), 2);
        assert_eq!(engine.array_get(&arr, 0).unwrap(), Value::Undefined);
        assert!(engine.own_property_names(&arr).unwrap().is_empty());

        engine.array_set(&arr, 4, Value::from(1)).unwrap();
        assert_eq!(engine.array_length(&arr).unwrap(), 5);
        assert_eq!(engine.own_property_names(&arr).unwrap(), vec!["4"]);
        assert_eq!(engine.get(&arr, "length").unwrap(), Value::Number(5.0));
    }

    #[test]
    fn test_call_native_function() {
        let engine = Engine::default();
        let add = engine
            .create_function("add", |_, _, args| {
                let sum: f64 = args.iter().filter_map(Value::as_number).sum();
                Ok(Value::Number(sum))
            })
            .unwrap();
        let result = engine
            .call(&add, &Value::Undefined, &[Value::from(1), Value::from(2)])
            .unwrap();
        assert_eq!(result, Value::Number(3.0));
    }

    #[test]
    fn test_call_holds_lock() {
        let engine = Engine::default();
        let probe = engine
            .create_function("probe", |engine, _, _| Ok(Value::Bool(engine.is_locked())))
            .unwrap();
        assert!(!engine.is_locked());
        assert_eq!(engine.call(&probe, &Value::Undefined, &[]).unwrap(), Value::Bool(true));
        assert!(!engine.is_locked());
    }

    #[test]
    fn test_calling_non_function_throws() {
        let engine = Engine::default();
        let obj = engine.create_object().unwrap();
        let err = engine.call(&obj, &Value::Undefined, &[]).unwrap_err();
        assert_eq!(engine.describe_error(&err), "TypeError: object is not a function");
    }

    #[test]
    fn test_report_exception() {
        let engine = Engine::default();
        let err = engine.throw_error("boom");
        engine.report_exception(&err);
        assert_eq!(engine.take_reported_exceptions(), vec!["Error: boom".to_string()]);
        assert!(engine.take_reported_exceptions().is_empty());
    }

    #[test]
    fn test_display_string() {
        let engine = Engine::default();
        let arr = engine
            .create_array_from(&[Value::from(1), Value::Null, Value::from("a")])
            .unwrap();
        assert_eq!(engine.to_display_string(&arr), "1,,a");
        assert_eq!(engine.to_display_string(&Value::Number(2.5)), "2.5");
        assert_eq!(engine.to_display_string(&Value::Number(f64::NAN)), "NaN");
    }

    #[test]
    fn test_display_large_integers() {
        let engine = Engine::default();
        assert_eq!(
            engine.to_display_string(&Value::Number(1e20)),
            "100000000000000000000"
        );
        assert_eq!(
            engine.to_display_string(&Value::Number(-9007199254740992.0)),
            "-9007199254740992"
        );
        assert_eq!(engine.to_display_string(&Value::Number(-0.0)), "0");
    }

    #[test]
    fn test_array_index_out_of_range() {
        let engine = Engine::default();
        let arr = engine.create_array(0).unwrap();

        for index in [usize::MAX, MAX_ARRAY_LENGTH] {
            assert!(matches!(
                engine.array_set(&arr, index, Value::from(1)),
                Err(EngineError::TypeError(_))
            ));
        }
        assert!(matches!(
            engine.set(&arr, &usize::MAX.to_string(), Value::from(1)),
            Err(EngineError::TypeError(_))
        ));
        assert!(matches!(
            engine.create_array(usize::MAX),
            Err(EngineError::TypeError(_))
        ));
        assert_eq!(engine.array_length(&arr).unwrap(), 0);
    }

    #[test]
    fn test_array_length_out_of_range() {
        let engine = Engine::default();
        let arr = engine.create_array(2).unwrap();

        for len in [1e300, f64::INFINITY, MAX_ARRAY_LENGTH as f64 + 1.0, -1.0, 1.5] {
            assert!(matches!(
                engine.set(&arr, "length", Value::Number(len)),
                Err(EngineError::TypeError(_))
            ));
        }
        assert_eq!(engine.array_length(&arr).unwrap(), 2);

        engine.set(&arr, "length", Value::from(1)).unwrap();
        assert_eq!(engine.array_length(&arr).unwrap(), 1);
    }

    #[test]
    fn test_non_canonical_index_keys() {
        let engine = Engine::default();
        let arr = engine
            .create_array_from(&[Value::from("a"), Value::from("b")])
            .unwrap();

        assert_eq!(engine.get(&arr, "1").unwrap(), Value::from("b"));
        for key in ["01", "+1", " 1"] {
            assert_eq!(engine.get(&arr, key).unwrap(), Value::Undefined);
            assert!(matches!(
                engine.set(&arr, key, Value::from("c")),
                Err(EngineError::TypeError(_))
            ));
        }
        assert_eq!(engine.get(&arr, "1").unwrap(), Value::from("b"));
        assert_eq!(engine.array_length(&arr).unwrap(), 2);
    }

    #[test]
    fn test_root_keeps_object_alive() {
        let engine = Engine::default();
        let obj = engine.create_object().unwrap();
        let root = engine.root(obj.clone());
        engine.collect();
        assert!(engine.is_alive(&obj));

        drop(root);
        engine.collect();
        assert!(!engine.is_alive(&obj));
    }

    #[test]
    fn test_safepoint_threshold() {
        let engine = Engine::new(EngineOptions::with_gc_threshold(2));
        engine.create_object().unwrap();
        assert!(!engine.safepoint());
        engine.create_object().unwrap();
        assert!(engine.safepoint());
        assert_eq!(engine.live_objects(), 0);
    }
}
