//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while decoding images or exporting a draw tree.
///
/// Geometry problems never appear here; the fitter and renderer clamp them.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An image source could not be fetched or decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Reading an image source from disk failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or rasterizing an export failed.
    #[error("Export failed: {0}")]
    Export(String),
}
