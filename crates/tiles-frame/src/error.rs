//! Frame error types.

use thiserror::Error;
use tiles_loader::LoaderError;

/// Errors surfaced by a [`Frame`](crate::Frame).
#[derive(Debug, Error)]
pub enum FrameError {
    /// A path was resolved before any path loader was available.
    #[error("tile not loaded")]
    TileNotLoaded,

    /// A loader or path loader failed.
    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// The host could not create the inner embedding.
    #[error("embedding failed: {0}")]
    Embed(String),

    /// The downward port of an embedding is closed.
    #[error("shuttle port closed")]
    PortClosed,
}

/// Result type for frame operations.
pub type FrameResult<T> = Result<T, FrameError>;
