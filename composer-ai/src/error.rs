//! Generation error types.

use thiserror::Error;

/// Result type for generation operations.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// Errors raised while talking to the generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The endpoint URL is invalid.
    #[error("invalid generation endpoint: {0}")]
    InvalidUrl(String),

    /// HTTP layer failed (connection, timeout, etc.).
    #[error("generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("failed to parse generation payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with a non-success status.
    #[error("generation service error {status}: {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Message from the service, or the raw body.
        message: String,
    },

    /// The service succeeded but returned no images.
    #[error("generation returned no images")]
    EmptyResult,

    /// A job is already running in this slot.
    #[error("a generation job is already running in slot '{0}'")]
    SlotBusy(String),
}
