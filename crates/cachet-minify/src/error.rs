//! Error types for cachet-minify.

/// Errors produced by minifier implementations.
#[derive(Debug, thiserror::Error)]
pub enum MinifyError {
    /// The minifier could not process the source text.
    #[error("cannot minify {kind} source: {message}")]
    Failed { kind: String, message: String },

    /// An external minifier tool could not be run.
    ///
    /// Unused by the built-ins; kept for host implementations that shell out.
    #[error("cannot execute external minifier: {source}")]
    Exec { source: std::io::Error },
}
