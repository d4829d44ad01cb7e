//! Error types for action-types crate.

use thiserror::Error;

/// Errors raised while building action values from untrusted input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionTypesError {
    #[error("Unknown action kind: {0}")]
    UnknownActionKind(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Result type alias for action-types operations.
pub type Result<T> = std::result::Result<T, ActionTypesError>;
