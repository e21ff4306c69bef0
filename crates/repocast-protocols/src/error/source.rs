//! Errors raised by external content collaborators.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("API returned HTTP error: {status} {reason}")]
    Http { status: u16, reason: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("{0}")]
    Upstream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
