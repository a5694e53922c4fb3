//! Tether bridge
//!
//! Exposes native objects to the embedded engine and lets native code hold
//! engine values safely:
//! - [`Instance`] adapts one [`BoundObject`](tether_sdk::BoundObject) to the
//!   engine's host-object hook, discovering methods and fields lazily through
//!   a per-object [`ReflectedClass`]
//! - [`ClassRegistry`] maps bound-object identity to its reflected class
//! - [`ScriptValue`] wraps one engine value behind a persistent root, with
//!   array, object, call and property-iteration operations
//! - [`marshal`] converts values across the boundary, with [`ScriptObject`]
//!   proxying script objects back to native code
//! - [`Bridge`] owns the registry for one engine and ties the pieces together
//!
//! Everything here runs on the engine's thread. The engine's exclusivity lock
//! is released while a bound object runs native code.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bridge;
pub mod instance;
pub mod iter;
pub mod marshal;
pub mod reflect;
pub mod script_object;
pub mod script_value;

pub use bridge::{Bridge, BridgeOptions};
pub use instance::Instance;
pub use iter::PropertyIterator;
pub use reflect::{ClassRegistry, Field, Method, ReflectedClass};
pub use script_object::ScriptObject;
pub use script_value::{ScriptValue, ValueType};

use tether_engine::EngineError;

/// Bridge errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    /// A bound object reported failure; the message is what script sees
    #[error("{message}")]
    Invocation {
        /// Error message thrown into script
        message: String,
    },

    /// A script call threw; the exception has already been reported
    #[error("Uncaught exception: {0}")]
    Exception(String),

    /// Engine-level failure (allocation limit, stale handle)
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl BridgeError {
    pub(crate) fn invocation(message: impl Into<String>) -> Self {
        BridgeError::Invocation {
            message: message.into(),
        }
    }
}

/// Bridge result type
pub type BridgeResult<T> = Result<T, BridgeError>;
