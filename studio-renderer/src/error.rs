//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The scene or requested output has no usable size.
    #[error("Invalid output size: {0}")]
    InvalidSize(String),

    /// The intermediate SVG could not be parsed or rasterized.
    #[error("Export failed: {0}")]
    Export(String),

    /// Encoding the raster output failed.
    #[error("Encoding failed: {0}")]
    Encode(String),
}
