//! Error handling module for DualStream

use thiserror::Error;

/// Main error type for DualStream operations
#[derive(Error, Debug)]
pub enum DualStreamError {
    /// A source URL could not be opened
    #[error("Failed to open source {url}: {message}")]
    OpenFailed { url: String, message: String },

    /// A source rejected the input as unreadable or unsupported
    #[error("Unsupported media in {url}: {message}")]
    UnsupportedMedia { url: String, message: String },

    /// A seek request failed on one of the underlying sources
    #[error("Seek to {position} us failed on {url}: {message}")]
    SeekFailed {
        url: String,
        position: i64,
        message: String,
    },

    /// Source-level read failure outside the normal end-of-stream path
    #[error("Read error on {url}: {message}")]
    ReadError { url: String, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for DualStream operations
pub type DualStreamResult<T> = std::result::Result<T, DualStreamError>;
