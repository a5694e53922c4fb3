//! HostObject trait - hook for objects implemented outside the engine
//!
//! A host wrapper is a heap object that delegates property access, calls,
//! enumeration and primitive conversion to a `HostObject`. The engine asks
//! the host first and falls back to ordinary ("expando") properties stored
//! on the wrapper for anything the host does not intercept.
//!
//! The engine holds its exclusivity lock while calling into a host; hosts
//! that run foreign code are expected to release it for the duration.

use std::any::Any;

use crate::engine::Engine;
use crate::value::{PreferredType, Value};
use crate::EngineResult;

/// Behaviour of a host wrapper
pub trait HostObject {
    /// Read a property. `Ok(None)` means "not mine", and the engine falls
    /// through to the wrapper's ordinary properties.
    fn get_property(&self, engine: &Engine, name: &str) -> EngineResult<Option<Value>>;

    /// Write a property. `Ok(false)` means "not mine", and the engine stores
    /// the value as an ordinary property on the wrapper.
    fn set_property(&self, engine: &Engine, name: &str, value: &Value) -> EngineResult<bool>;

    /// Whether `name` resolves to a host method
    fn has_method(&self, engine: &Engine, name: &str) -> bool;

    /// Invoke a host method read from this wrapper
    fn invoke_method(&self, engine: &Engine, name: &str, args: &[Value]) -> EngineResult<Value>;

    /// Whether the wrapper itself can be called
    fn is_callable(&self) -> bool;

    /// Call the wrapper as a function
    fn call(&self, engine: &Engine, args: &[Value]) -> EngineResult<Value>;

    /// Property names the host contributes to enumeration
    fn own_property_names(&self, engine: &Engine) -> Vec<String>;

    /// Convert to a primitive value
    fn to_primitive(&self, engine: &Engine, hint: PreferredType) -> EngineResult<Value>;

    /// Downcasting hook so embedders can recover their concrete host type
    fn as_any(&self) -> &dyn Any;
}
