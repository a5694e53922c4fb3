//! NativeValue - the marshalled form of a script value
//!
//! Everything a bound object receives as an argument, returns as a result or
//! hands out as a property value is a `NativeValue`. Primitives are carried
//! inline; objects travel as shared `BoundObject` handles. Script objects that
//! cross into native code arrive wrapped in a proxy that implements
//! `BoundObject` itself, so native code never sees raw engine handles.

use std::fmt;
use std::rc::Rc;

use crate::bound::{bound_identity, BoundObject};
use crate::error::{AbiResult, NativeError};

/// Marshalled value passed across the native/script boundary.
#[derive(Clone, Default)]
pub enum NativeValue {
    /// No value (script `undefined`)
    #[default]
    Void,
    /// Script `null`
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit floating point number
    Double(f64),
    /// String value (owned copy)
    String(String),
    /// Shared handle to an object implementing the capability interface
    Object(Rc<dyn BoundObject>),
}

impl NativeValue {
    /// Wrap a bound object
    pub fn object<T: BoundObject + 'static>(obj: T) -> Self {
        NativeValue::Object(Rc::new(obj))
    }

    /// Check if this is `Void`
    pub fn is_void(&self) -> bool {
        matches!(self, NativeValue::Void)
    }

    /// Check if this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, NativeValue::Null)
    }

    /// Get as boolean if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NativeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i32 if this is an Int32
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            NativeValue::Int32(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a number; Int32 widens to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NativeValue::Double(d) => Some(*d),
            NativeValue::Int32(i) => Some(f64::from(*i)),
            _ => None,
        }
    }

    /// Get as string slice if this is a String
    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the object handle if this is an Object
    pub fn as_object(&self) -> Option<&Rc<dyn BoundObject>> {
        match self {
            NativeValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Get as f64, reporting a type mismatch otherwise
    pub fn expect_f64(&self) -> AbiResult<f64> {
        self.as_f64().ok_or_else(|| self.mismatch("number"))
    }

    /// Get as string slice, reporting a type mismatch otherwise
    pub fn expect_str(&self) -> AbiResult<&str> {
        match self {
            NativeValue::String(s) => Ok(s),
            _ => Err(self.mismatch("string")),
        }
    }

    /// Get as bool, reporting a type mismatch otherwise
    pub fn expect_bool(&self) -> AbiResult<bool> {
        self.as_bool().ok_or_else(|| self.mismatch("boolean"))
    }

    fn mismatch(&self, expected: &str) -> NativeError {
        NativeError::TypeMismatch {
            expected: expected.to_string(),
            got: self.type_name().to_string(),
        }
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            NativeValue::Void => "void",
            NativeValue::Null => "null",
            NativeValue::Bool(_) => "boolean",
            NativeValue::Int32(_) => "int32",
            NativeValue::Double(_) => "double",
            NativeValue::String(_) => "string",
            NativeValue::Object(_) => "object",
        }
    }
}

impl PartialEq for NativeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NativeValue::Void, NativeValue::Void) => true,
            (NativeValue::Null, NativeValue::Null) => true,
            (NativeValue::Bool(a), NativeValue::Bool(b)) => a == b,
            (NativeValue::Int32(a), NativeValue::Int32(b)) => a == b,
            (NativeValue::Double(a), NativeValue::Double(b)) => a == b,
            (NativeValue::String(a), NativeValue::String(b)) => a == b,
            (NativeValue::Object(a), NativeValue::Object(b)) => {
                bound_identity(a) == bound_identity(b)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeValue::Void => write!(f, "NativeValue::Void"),
            NativeValue::Null => write!(f, "NativeValue::Null"),
            NativeValue::Bool(b) => write!(f, "NativeValue::Bool({})", b),
            NativeValue::Int32(i) => write!(f, "NativeValue::Int32({})", i),
            NativeValue::Double(d) => write!(f, "NativeValue::Double({})", d),
            NativeValue::String(s) => write!(f, "NativeValue::String({:?})", s),
            NativeValue::Object(obj) => {
                write!(f, "NativeValue::Object({:#x})", bound_identity(obj))
            }
        }
    }
}

impl From<bool> for NativeValue {
    fn from(b: bool) -> Self {
        NativeValue::Bool(b)
    }
}

impl From<i32> for NativeValue {
    fn from(i: i32) -> Self {
        NativeValue::Int32(i)
    }
}

impl From<f64> for NativeValue {
    fn from(d: f64) -> Self {
        NativeValue::Double(d)
    }
}

impl From<&str> for NativeValue {
    fn from(s: &str) -> Self {
        NativeValue::String(s.to_string())
    }
}

impl From<String> for NativeValue {
    fn from(s: String) -> Self {
        NativeValue::String(s)
    }
}

impl From<()> for NativeValue {
    fn from(_: ()) -> Self {
        NativeValue::Void
    }
}
