//! ScriptValue - a rooted engine value held by native code
//!
//! The engine's collector cannot see values stored in native data
//! structures. Every `ScriptValue` therefore owns a persistent [`Root`] for
//! the value it holds, for its whole lifetime:
//! - construction and `clone` take one root
//! - replacing the value roots the new value before the old root is released
//! - replacing a value with itself does nothing
//! - drop releases the root exactly once
//!
//! Clones are views: they share the underlying engine object.
//!
//! Typed accessors (`number_value`, the array operations, ...) require the
//! held value to have the matching type and panic otherwise; callers check
//! [`ScriptValue::value_type`] first.

use std::fmt;

use tether_engine::{Engine, EngineError, ObjectKind, Root, Value};

use crate::iter::PropertyIterator;
use crate::{BridgeError, BridgeResult};

/// Type of the value held by a [`ScriptValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Number
    Number,
    /// Boolean
    Boolean,
    /// String
    String,
    /// Array object
    Array,
    /// Callable object
    Function,
    /// Any other object
    Object,
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// Handle to an object that no longer exists
    Unknown,
}

/// One engine value, kept alive for as long as native code holds it
pub struct ScriptValue {
    root: Root,
    iter: Option<PropertyIterator>,
}

impl ScriptValue {
    /// `undefined`
    pub fn new(engine: &Engine) -> Self {
        Self::adopt(engine, Value::Undefined)
    }

    /// Take ownership of `value`, rooting it
    pub fn adopt(engine: &Engine, value: Value) -> Self {
        Self {
            root: Root::new(engine, value),
            iter: None,
        }
    }

    /// The execution context this value belongs to
    pub fn context(&self) -> &Engine {
        self.root.engine()
    }

    /// The held engine value
    pub fn engine_value(&self) -> &Value {
        self.root.value()
    }

    /// Classify the held value
    pub fn value_type(&self) -> ValueType {
        match self.engine_value() {
            Value::Number(_) => ValueType::Number,
            Value::Bool(_) => ValueType::Boolean,
            Value::String(_) => ValueType::String,
            Value::Object(_) => match self.context().object_kind(self.engine_value()) {
                Some(ObjectKind::Array) => ValueType::Array,
                Some(ObjectKind::Function) => ValueType::Function,
                Some(ObjectKind::Plain) | Some(ObjectKind::Host) => ValueType::Object,
                None => ValueType::Unknown,
            },
            Value::Undefined => ValueType::Undefined,
            Value::Null => ValueType::Null,
        }
    }

    /// Check if the held value is `undefined`
    pub fn is_undefined(&self) -> bool {
        self.engine_value().is_undefined()
    }

    /// Check if the held value is `null`
    pub fn is_null(&self) -> bool {
        self.engine_value().is_null()
    }

    /// Check if the held value is an array
    pub fn is_array(&self) -> bool {
        self.value_type() == ValueType::Array
    }

    /// Check if the held value is callable
    pub fn is_function(&self) -> bool {
        self.value_type() == ValueType::Function
    }

    /// Check if the held value has properties (object, array or function)
    pub fn is_object_like(&self) -> bool {
        matches!(
            self.value_type(),
            ValueType::Object | ValueType::Array | ValueType::Function
        )
    }

    // ========================================================================
    // Replacement
    // ========================================================================

    /// Hold `value` instead of the current value
    fn replace(&mut self, value: Value) {
        if self.engine_value().same_value(&value) {
            return;
        }
        let root = Root::new(self.context(), value);
        self.root = root;
        self.iter = None;
    }

    /// Make this value a view of `other`
    pub fn assign(&mut self, other: &ScriptValue) {
        self.replace(other.engine_value().clone());
    }

    /// Hold `null`
    pub fn set_null(&mut self) {
        self.replace(Value::Null);
    }

    /// Hold `undefined`
    pub fn set_undefined(&mut self) {
        self.replace(Value::Undefined);
    }

    /// Hold a number
    pub fn set_number(&mut self, n: f64) {
        self.replace(Value::Number(n));
    }

    /// Hold a boolean
    pub fn set_bool(&mut self, b: bool) {
        self.replace(Value::Bool(b));
    }

    /// Hold a string
    pub fn set_string(&mut self, s: &str) {
        self.replace(Value::string(s));
    }

    // ========================================================================
    // Primitive accessors
    // ========================================================================

    /// The held number
    ///
    /// # Panics
    ///
    /// Panics if the held value is not a number.
    pub fn number_value(&self) -> f64 {
        match self.engine_value() {
            Value::Number(n) => *n,
            other => panic!("number_value called on {} value", other.type_name()),
        }
    }

    /// The held boolean
    ///
    /// # Panics
    ///
    /// Panics if the held value is not a boolean.
    pub fn bool_value(&self) -> bool {
        match self.engine_value() {
            Value::Bool(b) => *b,
            other => panic!("bool_value called on {} value", other.type_name()),
        }
    }

    /// The held string; its `len()` is the UTF-8 byte length
    ///
    /// # Panics
    ///
    /// Panics if the held value is not a string.
    pub fn string_value(&self) -> &str {
        match self.engine_value() {
            Value::String(s) => s,
            other => panic!("string_value called on {} value", other.type_name()),
        }
    }

    // ========================================================================
    // Arrays
    // ========================================================================

    fn expect_array(&self) -> &Value {
        assert!(
            self.is_array(),
            "array operation on {:?} value",
            self.value_type()
        );
        self.engine_value()
    }

    /// Hold a fresh array of `len` empty slots
    pub fn set_array_type(&mut self, len: usize) -> BridgeResult<()> {
        let array = self.context().create_array(len)?;
        self.replace(array);
        Ok(())
    }

    /// Store `value` at `index`, growing the array if needed
    ///
    /// # Panics
    ///
    /// Panics if the held value is not an array.
    pub fn set_array_value(&self, index: usize, value: &ScriptValue) -> BridgeResult<()> {
        let array = self.expect_array();
        self.context()
            .array_set(array, index, value.engine_value().clone())?;
        Ok(())
    }

    /// Store `values` at indices `0..values.len()`
    ///
    /// # Panics
    ///
    /// Panics if the held value is not an array.
    pub fn set_array_values(&self, values: &[ScriptValue]) -> BridgeResult<()> {
        for (index, value) in values.iter().enumerate() {
            self.set_array_value(index, value)?;
        }
        Ok(())
    }

    /// Append `value`; returns the new length
    ///
    /// # Panics
    ///
    /// Panics if the held value is not an array.
    pub fn push_array_value(&self, value: &ScriptValue) -> BridgeResult<usize> {
        let array = self.expect_array();
        Ok(self
            .context()
            .array_push(array, value.engine_value().clone())?)
    }

    /// Remove and return the last element
    ///
    /// # Panics
    ///
    /// Panics if the held value is not an array.
    pub fn pop_array_value(&self) -> BridgeResult<ScriptValue> {
        let array = self.expect_array();
        let value = self.context().array_pop(array)?;
        Ok(ScriptValue::adopt(self.context(), value))
    }

    /// Element at `index`; empty slots read as `undefined`
    ///
    /// # Panics
    ///
    /// Panics if the held value is not an array.
    pub fn array_value(&self, index: usize) -> BridgeResult<ScriptValue> {
        let array = self.expect_array();
        let value = self.context().array_get(array, index)?;
        Ok(ScriptValue::adopt(self.context(), value))
    }

    /// Array length
    ///
    /// # Panics
    ///
    /// Panics if the held value is not an array.
    pub fn array_length(&self) -> BridgeResult<usize> {
        let array = self.expect_array();
        Ok(self.context().array_length(array)?)
    }

    // ========================================================================
    // Objects
    // ========================================================================

    fn expect_object(&self) -> &Value {
        assert!(
            self.is_object_like(),
            "property operation on {:?} value",
            self.value_type()
        );
        self.engine_value()
    }

    /// Hold a fresh empty object
    pub fn set_object_type(&mut self) -> BridgeResult<()> {
        let object = self.context().create_object()?;
        self.replace(object);
        Ok(())
    }

    /// Store `value` under `key`
    ///
    /// # Panics
    ///
    /// Panics if the held value is not object-like.
    pub fn set_property(&self, key: &str, value: &ScriptValue) -> BridgeResult<()> {
        let object = self.expect_object();
        self.context()
            .set(object, key, value.engine_value().clone())?;
        Ok(())
    }

    /// The value under `key`, or `None` if the object has no such property
    ///
    /// # Panics
    ///
    /// Panics if the held value is not object-like.
    pub fn property(&self, key: &str) -> BridgeResult<Option<ScriptValue>> {
        let object = self.expect_object();
        let engine = self.context();
        let value = engine.get(object, key)?;
        if value.is_undefined() && !engine.own_property_names(object)?.iter().any(|k| k == key) {
            return Ok(None);
        }
        Ok(Some(ScriptValue::adopt(engine, value)))
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Snapshot the own property names and return a cursor at the first one,
    /// or `None` when there are none. Restarts any earlier iteration.
    ///
    /// # Panics
    ///
    /// Panics if the held value is not object-like.
    pub fn first(&mut self) -> BridgeResult<Option<&PropertyIterator>> {
        let object = self.expect_object().clone();
        let engine = self.context().clone();
        let keys = engine.own_property_names(&object)?;
        let iter = self.iter.insert(PropertyIterator::new(engine, object, keys));
        Ok(if iter.is_valid() { Some(&*iter) } else { None })
    }

    /// Advance the cursor. Returns `None` once every key has been visited,
    /// and keeps returning `None` until [`first`](Self::first) is called.
    pub fn get_next(&mut self) -> Option<&PropertyIterator> {
        let iter = self.iter.as_mut()?;
        if iter.advance() {
            Some(&*iter)
        } else {
            None
        }
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Call the held function with itself as the receiver.
    ///
    /// A thrown exception is reported through the engine's error path and
    /// returned as [`BridgeError::Exception`].
    ///
    /// # Panics
    ///
    /// Panics if the held value is not a function.
    pub fn call(&self, args: &[ScriptValue]) -> BridgeResult<ScriptValue> {
        assert!(
            self.is_function(),
            "call on {:?} value",
            self.value_type()
        );
        let engine = self.context();
        let callee = self.engine_value();
        let args: Vec<Value> = args.iter().map(|a| a.engine_value().clone()).collect();

        match engine.call(callee, callee, &args) {
            Ok(result) => Ok(ScriptValue::adopt(engine, result)),
            Err(err @ EngineError::Exception(_)) => {
                engine.report_exception(&err);
                Err(BridgeError::Exception(engine.describe_error(&err)))
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl Clone for ScriptValue {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            iter: None,
        }
    }
}

impl PartialEq for ScriptValue {
    fn eq(&self, other: &Self) -> bool {
        self.context().ptr_eq(other.context()) && self.engine_value().same_value(other.engine_value())
    }
}

impl fmt::Debug for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptValue")
            .field("type", &self.value_type())
            .field("value", self.engine_value())
            .finish()
    }
}
