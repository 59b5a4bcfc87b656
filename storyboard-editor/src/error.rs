//! Error types for storyboard-editor
//!
//! Only transient remote failures and missing session context are errors.
//! Invalid boundary, split, merge or move requests are rejected as no-ops
//! and reported through `bool`/`Option` return values instead.

use thiserror::Error;

/// Editor error type
#[derive(Debug, Error)]
pub enum EditorError {
    /// Request never produced a response (connect, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Collaborator answered with a non-success status
    #[error("Remote error {status}: {message}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Operation requires a loaded processing job
    #[error("No processing job loaded")]
    NoActiveJob,

    /// storyboard-common error
    #[error("Common error: {0}")]
    Common(#[from] storyboard_common::Error),
}

impl From<reqwest::Error> for EditorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            EditorError::Parse(err.to_string())
        } else {
            EditorError::Network(err.to_string())
        }
    }
}

/// Result type for editor operations
pub type EditorResult<T> = Result<T, EditorError>;
