//! Property error types

use thiserror::Error;

/// Errors raised while resolving or driving a property adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// No adapter is registered under the key
    #[error("Unknown property: {0}")]
    Unknown(String),

    /// The adapter exists but animates a different value type
    #[error("Property `{key}` animates `{found}`, not `{expected}`")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The adapter exists but reads from a different holder type
    #[error("Property `{key}` belongs to `{found}`, not `{expected}`")]
    HolderMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Result type for property operations
pub type Result<T> = std::result::Result<T, PropertyError>;
