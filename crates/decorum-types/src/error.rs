//! Type system errors

use thiserror::Error;

/// Errors that can occur while building or reading type references
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeError {
    /// Malformed type text
    #[error("Cannot parse type '{input}': {reason}")]
    Parse {
        /// Text that failed to parse
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// Type declared twice in the same hierarchy
    #[error("Type already declared: {name}")]
    DuplicateType {
        /// Raw identity of the type
        name: String,
    },

    /// Reference to a type the hierarchy does not know
    #[error("Undefined type: {name}")]
    UndefinedType {
        /// Raw identity that was not found
        name: String,
    },

    /// Circular supertype declaration
    #[error("Circular type reference detected: {cycle}")]
    CircularReference {
        /// Description of the cycle
        cycle: String,
    },

    /// Invalid type argument count
    #[error("Invalid type argument count for {name}: expected {expected}, got {actual}")]
    InvalidTypeArgCount {
        /// Raw identity of the type
        name: String,
        /// Declared type variable count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },
}
