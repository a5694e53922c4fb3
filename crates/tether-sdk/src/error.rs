//! Error types for bound-object calls

/// Result type for bound-object calls
pub type AbiResult<T> = Result<T, NativeError>;

/// Errors a bound object reports back to the bridge
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NativeError {
    /// The native implementation ran but did not produce a result
    #[error("Invocation failed: {0}")]
    InvocationFailed(String),

    /// The object cannot be called as a function
    #[error("Object is not callable")]
    NotCallable,

    /// The requested member is not supported by the object
    #[error("No such member: {0}")]
    NotFound(String),

    /// Type mismatch during conversion
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: String,
        /// Actual type name
        got: String,
    },

    /// Invalid argument
    #[error("Argument error: {0}")]
    ArgumentError(String),
}

impl From<String> for NativeError {
    fn from(s: String) -> Self {
        NativeError::InvocationFailed(s)
    }
}

impl From<&str> for NativeError {
    fn from(s: &str) -> Self {
        NativeError::InvocationFailed(s.to_string())
    }
}
