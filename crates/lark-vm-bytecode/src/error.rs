//! Bytecode errors

use thiserror::Error;

/// Errors that can occur while decoding action records.
///
/// Every variant is fatal to the tag being decoded, never to its siblings.
#[derive(Debug, Error)]
pub enum BytecodeError {
    /// A read ran past the end of the available bytes
    #[error("Unexpected end of bytecode at offset {offset}: needed {needed} bytes, {available} available")]
    UnexpectedEnd {
        /// Offset of the read
        offset: usize,
        /// Bytes requested
        needed: usize,
        /// Bytes left
        available: usize,
    },

    /// A record declared more operand or body bytes than the stream holds
    #[error("Truncated action 0x{code:02X} at offset {offset}: declared {declared} bytes, {available} available")]
    Truncated {
        /// Action code of the record
        code: u8,
        /// Offset of the record header
        offset: usize,
        /// Declared length
        declared: usize,
        /// Bytes left
        available: usize,
    },

    /// A string operand was not NUL-terminated inside its record
    #[error("Unterminated string at offset {offset}")]
    UnterminatedString {
        /// Offset where the string started
        offset: usize,
    },

    /// Unknown push value type tag
    #[error("Invalid push value type {tag} at offset {offset}")]
    InvalidPushType {
        /// The type tag
        tag: u8,
        /// Offset of the tag byte
        offset: usize,
    },

    /// A button condition entry smaller than its own header
    #[error("Invalid button condition size {size} at offset {offset}")]
    InvalidConditionSize {
        /// Declared entry size
        size: u16,
        /// Offset of the entry
        offset: usize,
    },

    /// `With` or function bodies nested deeper than the decoder allows
    #[error("Action bodies nested deeper than {limit} at offset {offset}")]
    NestingTooDeep {
        /// Offset of the record whose body would exceed the limit
        offset: usize,
        /// Maximum nesting depth
        limit: usize,
    },

    /// IO error while reading a stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bytecode operations
pub type Result<T> = std::result::Result<T, BytecodeError>;
