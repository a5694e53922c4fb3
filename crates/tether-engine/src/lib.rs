//! Tether reference engine
//!
//! A small garbage-collected object engine that provides the services the
//! bridge consumes:
//! - Value construction (primitives, objects, arrays, native functions)
//! - Host wrappers that delegate to a [`HostObject`]
//! - Counted persistent roots and an RAII [`Root`] guard
//! - Mark-sweep collection with generation-checked handles
//! - A reentrant exclusivity lock that can be fully dropped around native calls
//! - Exceptions as thrown `Error` objects, plus an error-reporting path
//!
//! The engine is single-threaded: [`Engine`] is a cheap `Rc` handle and is
//! neither `Send` nor `Sync`.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod defaults;
pub mod engine;
pub mod gc;
pub mod host;
pub mod lock;
pub mod object;
pub mod value;

pub use engine::{Engine, EngineOptions};
pub use gc::{GcStats, Root};
pub use host::HostObject;
pub use lock::{DropAllLocks, EngineLock};
pub use object::{NativeFn, ObjectKind};
pub use value::{Handle, PreferredType, Value};

/// Engine errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// Handle refers to an object that has been collected
    #[error("Stale handle: {0:?}")]
    StaleHandle(Handle),

    /// Operation applied to a value of the wrong type
    #[error("Type error: {0}")]
    TypeError(String),

    /// Heap object limit reached
    #[error("Heap limit exceeded ({0} objects)")]
    HeapLimitExceeded(usize),

    /// A script-level exception; the payload is the thrown value
    #[error("Uncaught exception")]
    Exception(Value),
}

/// Engine result type
pub type EngineResult<T> = Result<T, EngineError>;
