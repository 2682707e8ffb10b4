//! Client-side error type.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by [`crate::ApiClient`], the upload dispatcher and the
/// record editor.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Raised before any request is made.
    #[error("Unrecognized upload origin: '{0}'")]
    UnrecognizedOrigin(String),

    #[error("{0}")]
    Validation(String),

    #[error("Request failed ({status}): {message}")]
    Http { status: StatusCode, message: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// HTTP status for errors returned by the server.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }
}
