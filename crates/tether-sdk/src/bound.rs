//! BoundObject trait - the capability interface of exposed native objects
//!
//! A bound object is any native object the embedder wants script code to see.
//! The bridge never inspects the object's Rust type; it only asks the
//! questions below, by name, and caches the positive answers.

use std::any::Any;
use std::rc::Rc;

use crate::error::{AbiResult, NativeError};
use crate::value::NativeValue;

/// Iterator over an object's own property names.
pub type PropertyKeys<'a> = Box<dyn Iterator<Item = String> + 'a>;

/// Capability interface a native object implements to be exposed to script.
///
/// Objects are identified by the address of their shared handle: two
/// `Rc<dyn BoundObject>` clones are the same object, two separately
/// allocated objects never are. The member set reported by `has_method` and
/// `has_property` is expected to be fixed once the object is exposed; the
/// bridge caches every positive answer for the lifetime of its registry.
///
/// Calls may block, run arbitrarily long, or re-enter the engine. The bridge
/// releases the engine's exclusivity lock around `invoke`, `invoke_method`
/// and `properties`.
pub trait BoundObject {
    /// Whether the object has a callable member named `name`
    fn has_method(&self, name: &str) -> bool;

    /// Whether the object has a readable/writable property named `name`
    fn has_property(&self, name: &str) -> bool;

    /// Invoke the member `name`
    fn invoke_method(&self, name: &str, args: &[NativeValue]) -> AbiResult<NativeValue>;

    /// Invoke the object itself as a function
    fn invoke(&self, _args: &[NativeValue]) -> AbiResult<NativeValue> {
        Err(NativeError::NotCallable)
    }

    /// Whether `invoke` is supported
    fn is_function(&self) -> bool {
        false
    }

    /// Read the property `name`
    fn get_property(&self, name: &str) -> NativeValue;

    /// Write the property `name`
    fn set_property(&self, name: &str, value: NativeValue);

    /// String form used when script coerces the object to a primitive
    fn string_value(&self) -> String;

    /// Own property names, in the object's preferred order
    fn properties(&self) -> PropertyKeys<'_> {
        Box::new(std::iter::empty())
    }

    /// Downcasting hook for proxies that need to recognise their own kind
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
}

/// Identity of a bound object (address of the shared allocation).
#[inline]
pub fn bound_identity(obj: &Rc<dyn BoundObject>) -> usize {
    Rc::as_ptr(obj) as *const () as usize
}
