//! Error types for template operations.

use thiserror::Error;

/// Result type for template operations.
pub type ArtboardResult<T> = Result<T, ArtboardError>;

/// Errors that can occur while editing, importing or publishing a template.
///
/// Degenerate geometry is never reported through this type: sizes, scales and
/// radii are clamped in place by the normalization routines instead.
#[derive(Debug, Error)]
pub enum ArtboardError {
    /// Element not found in the template.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// An element with the same id already exists in the template.
    #[error("Duplicate element id: {0}")]
    DuplicateElement(String),

    /// The operation is not allowed in the current session mode or state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Imported data could not be parsed as a template.
    #[error("Malformed template: {0}")]
    MalformedImport(String),

    /// Publishing was attempted with no elements on the artboard.
    #[error("Cannot publish an empty template")]
    EmptyTemplate,

    /// Template serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
