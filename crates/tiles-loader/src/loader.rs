//! Loader and path loader traits.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tiles_protocol::PathResponse;

use crate::error::LoaderResult;
use crate::manifest::Manifest;

/// Resolves tile-relative paths to resources.
///
/// Implementations receive paths that already went through
/// [`canonical_path`](crate::canonical_path): absolute, dot segments
/// removed, no query or fragment.
#[async_trait]
pub trait PathLoader: Send + Sync {
    /// Resolve a canonical path.
    ///
    /// A missing resource is a `404` response, not an error. Errors are
    /// reserved for failures of the loader itself.
    async fn resolve_path(&self, path: &str) -> LoaderResult<PathResponse>;
}

/// A pluggable strategy that turns a source identifier into tile data.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Load the tile behind `source`.
    ///
    /// Returns `Ok(None)` when the source is not handled by this loader, so
    /// the registry moves on to the next one. An `Err` stops resolution.
    async fn load(&self, source: &str) -> LoaderResult<Option<TileData>>;
}

impl fmt::Debug for dyn Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// What a loader produces: the manifest and the path loader serving the
/// tile's resources.
#[derive(Clone)]
pub struct TileData {
    /// The tile manifest.
    pub manifest: Manifest,
    /// Resolver for the tile's own paths.
    pub path_loader: Arc<dyn PathLoader>,
}

impl TileData {
    /// Bundle a manifest with its path loader.
    #[must_use]
    pub fn new(manifest: Manifest, path_loader: Arc<dyn PathLoader>) -> Self {
        Self {
            manifest,
            path_loader,
        }
    }
}

impl fmt::Debug for TileData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileData")
            .field("manifest", &self.manifest)
            .finish_non_exhaustive()
    }
}
