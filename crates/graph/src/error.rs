//! Graph-level error types.

use thiserror::Error;

/// Errors produced while reading an imported automation document.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The file is not JSON at all.
    #[error("import file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is not a JSON object.
    #[error("import document must be a JSON object")]
    NotAnObject,

    /// A required field is missing or has the wrong shape.
    #[error("import document is missing '{field}'")]
    MissingField { field: &'static str },

    /// `steps` is present but is not an array.
    #[error("import document 'steps' must be an array")]
    StepsNotSequence,
}
