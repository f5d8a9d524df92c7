//! Loader error types.

use std::path::PathBuf;

/// Errors from loaders and path loaders.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// A loader claimed the source but failed to produce tile data.
    #[error("loader {loader} failed for {source_id}: {message}")]
    Failed {
        /// Name of the failing loader.
        loader: String,
        /// The source being loaded.
        source_id: String,
        /// Failure reason.
        message: String,
    },

    /// The tile manifest could not be parsed.
    #[error("manifest parse error in {path}: {message}")]
    ManifestParse {
        /// Path to the manifest file.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// A tile path could not be normalized.
    #[error("invalid tile path {path:?}: {message}")]
    InvalidPath {
        /// The offending path.
        path: String,
        /// Why it was rejected.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for loader operations.
pub type LoaderResult<T> = Result<T, LoaderError>;
