//! Tether SDK - Lightweight SDK for writing bound objects
//!
//! This crate provides the minimal types and traits needed to expose a native
//! object to script through the Tether bridge without depending on the
//! engine or the bridge itself.
//!
//! # Example
//!
//! ```ignore
//! use tether_sdk::{AbiResult, BoundObject, NativeError, NativeValue};
//!
//! struct Counter(std::cell::Cell<i32>);
//!
//! impl BoundObject for Counter {
//!     fn has_method(&self, name: &str) -> bool { name == "increment" }
//!     fn has_property(&self, name: &str) -> bool { name == "value" }
//!     fn invoke_method(&self, name: &str, _args: &[NativeValue]) -> AbiResult<NativeValue> {
//!         match name {
//!             "increment" => { self.0.set(self.0.get() + 1); Ok(NativeValue::Void) }
//!             _ => Err(NativeError::NotFound(name.to_string())),
//!         }
//!     }
//!     fn get_property(&self, _name: &str) -> NativeValue { NativeValue::Int32(self.0.get()) }
//!     fn set_property(&self, _name: &str, _value: NativeValue) {}
//!     fn string_value(&self) -> String { format!("Counter({})", self.0.get()) }
//! }
//! ```

#![warn(missing_docs)]

pub mod bound;
pub mod error;
pub mod value;

pub use bound::{bound_identity, BoundObject, PropertyKeys};
pub use error::{AbiResult, NativeError};
pub use value::NativeValue;
