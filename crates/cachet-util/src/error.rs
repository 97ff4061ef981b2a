//! Error type shared by the utility helpers.

use thiserror::Error;

/// Errors produced by the filesystem and hashing helpers.
#[derive(Debug, Error)]
pub enum UtilError {
    /// A filesystem operation failed.
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// A directory listing pattern could not be compiled.
    #[error("invalid listing pattern {pattern}: {message}")]
    Pattern { pattern: String, message: String },
}
