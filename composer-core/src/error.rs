//! Error types for layer editing operations.

use thiserror::Error;

/// Result type for composer operations.
pub type ComposerResult<T> = Result<T, ComposerError>;

/// Errors that can occur while editing a layer stack.
#[derive(Debug, Error)]
pub enum ComposerError {
    /// Layer not found in the stack.
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    /// The layer is locked and cannot be selected or transformed.
    #[error("Layer is locked: {0}")]
    LayerLocked(String),

    /// Operation not valid in the current editor state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Session/preset serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A document parsed but its contents are not usable.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}
