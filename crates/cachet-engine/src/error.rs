//! Error types for the cachet engine.

use cachet_config::PathError;
use cachet_minify::MinifyError;
use cachet_util::UtilError;

/// Errors produced while registering, compiling, or bundling assets.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A file could not be read or written.
    #[error("cannot access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A filesystem helper failed.
    #[error(transparent)]
    Util(#[from] UtilError),

    /// An input could not be resolved against the configured roots.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A minifier rejected its input.
    #[error(transparent)]
    Minify(#[from] MinifyError),

    /// A build was attempted with no registered source files.
    #[error("no source files registered for {output}")]
    EmptyAssetSet { output: String },

    /// No minifier is registered for the asset kind.
    #[error("no minifier registered for \"{kind}\" files")]
    UnsupportedKind { kind: String },

    /// A source file already contains the placeholder text reserved for an
    /// excluded file, so substitution would corrupt the output.
    #[error("{url} contains the placeholder reserved for {reserved_for}")]
    PlaceholderCollision { url: String, reserved_for: String },

    /// A fingerprint entry could not be encoded.
    #[error("cannot encode fingerprint entry for {key}: {message}")]
    Entry { key: String, message: String },

    /// A key-value store operation failed.
    #[error("store operation failed for {key}: {message}")]
    Store { key: String, message: String },
}
