//! Renderer error types.

use composer_core::ComposerError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Resource loading failed (missing file, malformed data URI).
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Image bytes could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Off-screen surface could not be allocated.
    #[error("Surface error: {0}")]
    Surface(String),

    /// Encoding the output raster failed.
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Font data could not be parsed.
    #[error("Font error: {0}")]
    Font(String),

    /// The editor session refused the result.
    #[error(transparent)]
    Core(#[from] ComposerError),
}
