//! Chat-level error type.

use thiserror::Error;

/// Errors returned by a chat session or an assistant backend.
///
/// None of these end the session; the caller shows them and the user may
/// send again.
#[derive(Debug, Error)]
pub enum ChatError {
    /// A request is already in flight and the session rejects overlaps.
    #[error("a message is already being sent")]
    Busy,

    /// Blank message text.
    #[error("message is empty")]
    EmptyMessage,

    /// `retry` with no user message in the history.
    #[error("there is no message to retry")]
    NothingToRetry,

    /// The assistant service failed or answered with something unusable.
    #[error("assistant error: {0}")]
    Backend(String),

    /// The history store could not be read or written.
    #[error("history store error: {0}")]
    Store(String),

    #[error("history encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}
