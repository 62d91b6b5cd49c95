//! VM error types

use crate::value::Value;
use lark_vm_bytecode::BytecodeError;
use thiserror::Error;

/// VM execution errors
#[derive(Debug, Error)]
pub enum VmError {
    /// Malformed action stream
    #[error("Decode error: {0}")]
    Decode(#[from] BytecodeError),

    /// Type error (e.g., calling a non-function)
    #[error("TypeError: {0}")]
    TypeError(String),

    /// Member access on null or undefined
    #[error("TypeError: Cannot access a property or method of a null object reference: {0}")]
    NullReference(String),

    /// Reference error (undefined variable or class)
    #[error("ReferenceError: {0}")]
    ReferenceError(String),

    /// Range error (out of bounds, short domain memory)
    #[error("RangeError: {0}")]
    RangeError(String),

    /// A host file could not be opened
    #[error("IOError: File not found: {0}")]
    FileOpen(String),

    /// Host I/O failure other than a missing file
    #[error("IOError: {0}")]
    Io(String),

    /// Wrong number of arguments to a host function
    #[error("ArgumentError: {function} expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        /// Function name as seen by script
        function: String,
        /// Expected count, as written in the message
        expected: String,
        /// Supplied count
        actual: usize,
    },

    /// Host capability check failed
    #[error("SecurityError: {0}")]
    PermissionDenied(String),

    /// A branch landed before the block or inside a record
    #[error("Invalid jump target {offset}")]
    InvalidJump {
        /// Target byte offset within the block
        offset: i64,
    },

    /// Call depth limit exceeded
    #[error("StackOverflowError: maximum call depth exceeded")]
    StackOverflow,

    /// Value raised by `ActionThrow`
    #[error("Uncaught exception: {0}")]
    Thrown(Value),

    /// Internal error
    #[error("InternalError: {0}")]
    Internal(String),
}

impl VmError {
    /// Create a type error
    pub fn type_error(msg: impl Into<String>) -> Self {
        Self::TypeError(msg.into())
    }

    /// Create a null reference error
    pub fn null_reference(msg: impl Into<String>) -> Self {
        Self::NullReference(msg.into())
    }

    /// Create a reference error
    pub fn reference_error(msg: impl Into<String>) -> Self {
        Self::ReferenceError(msg.into())
    }

    /// Create a range error
    pub fn range_error(msg: impl Into<String>) -> Self {
        Self::RangeError(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an arity error
    pub fn argument_count(function: impl Into<String>, expected: impl Into<String>, actual: usize) -> Self {
        Self::ArgumentCount {
            function: function.into(),
            expected: expected.into(),
            actual,
        }
    }

    /// Player error number for errors visible to script, if any
    pub fn error_id(&self) -> Option<u32> {
        match self {
            VmError::FileOpen(_) => Some(1500),
            VmError::RangeError(_) => Some(2030),
            VmError::ArgumentCount { .. } => Some(1063),
            VmError::ReferenceError(_) => Some(1065),
            VmError::NullReference(_) => Some(1009),
            VmError::TypeError(_) => Some(1006),
            VmError::StackOverflow => Some(1023),
            VmError::PermissionDenied(_) => Some(2148),
            VmError::Decode(_)
            | VmError::Io(_)
            | VmError::InvalidJump { .. }
            | VmError::Thrown(_)
            | VmError::Internal(_) => None,
        }
    }
}

/// Result type for VM operations
pub type VmResult<T> = std::result::Result<T, VmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_ids() {
        assert_eq!(VmError::FileOpen("a.txt".into()).error_id(), Some(1500));
        assert_eq!(VmError::range_error("short").error_id(), Some(2030));
        assert_eq!(VmError::argument_count("exec", "1 or more", 0).error_id(), Some(1063));
        assert_eq!(VmError::InvalidJump { offset: -3 }.error_id(), None);
    }

    #[test]
    fn test_thrown_message() {
        let err = VmError::Thrown(Value::string("boom"));
        assert_eq!(err.to_string(), "Uncaught exception: boom");
    }
}
