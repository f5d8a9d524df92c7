//! Loading tiles unpacked in a local directory.
//!
//! A tile directory holds a `manifest.json` next to the tile's resources.
//! Sources are either `file://` URLs or plain directory paths.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use mime_guess::{MimeGuess, mime};
use percent_encoding::percent_decode_str;
use tiles_protocol::PathResponse;
use tracing::debug;
use url::Url;

use crate::error::{LoaderError, LoaderResult};
use crate::loader::{Loader, PathLoader, TileData};
use crate::manifest::Manifest;

/// Manifest file looked up in a tile directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Served for directory paths (`/`, `/docs/`).
const INDEX_FILE_NAME: &str = "index.html";

/// Claims local tile directories.
#[derive(Debug, Clone, Default)]
pub struct FsLoader;

impl FsLoader {
    /// Create a filesystem loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Map a source to a candidate directory, or `None` if the source is
    /// another loader's business.
    fn source_dir(source: &str) -> Option<PathBuf> {
        if source.starts_with("file:") {
            return Url::parse(source).ok()?.to_file_path().ok();
        }
        if source.contains("://") || source.is_empty() {
            return None;
        }
        Some(PathBuf::from(source))
    }
}

#[async_trait]
impl Loader for FsLoader {
    fn name(&self) -> &str {
        "fs"
    }

    async fn load(&self, source: &str) -> LoaderResult<Option<TileData>> {
        let Some(dir) = Self::source_dir(source) else {
            return Ok(None);
        };

        let manifest_path = dir.join(MANIFEST_FILE_NAME);
        let content = match tokio::fs::read(&manifest_path).await {
            Ok(content) => content,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                debug!(path = %manifest_path.display(), "No tile manifest, declining source");
                return Ok(None);
            },
            Err(e) => return Err(e.into()),
        };

        let manifest =
            Manifest::from_slice(&content).map_err(|e| LoaderError::ManifestParse {
                path: manifest_path.clone(),
                message: e.to_string(),
            })?;

        let root = tokio::fs::canonicalize(&dir).await?;
        debug!(root = %root.display(), title = ?manifest.title(), "Loaded tile manifest");

        Ok(Some(TileData::new(
            manifest,
            Arc::new(FsPathLoader::new(root)),
        )))
    }
}

/// Serves files below a tile root directory.
#[derive(Debug, Clone)]
pub struct FsPathLoader {
    root: PathBuf,
}

impl FsPathLoader {
    /// Serve files below `root`. The root should already be canonical.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory being served.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a canonical tile path to a file below the root.
    ///
    /// Returns `None` for paths that would name something outside the root
    /// once percent-decoded.
    fn candidate(&self, path: &str) -> Option<PathBuf> {
        let decoded = percent_decode_str(path).decode_utf8().ok()?;
        let mut file = self.root.clone();
        for segment in decoded.split('/').filter(|s| !s.is_empty()) {
            if matches!(segment, "." | "..")
                || segment.contains('\\')
                || segment.contains('\0')
                || Path::new(segment).has_root()
            {
                return None;
            }
            file.push(segment);
        }
        if decoded.is_empty() || decoded.ends_with('/') {
            file.push(INDEX_FILE_NAME);
        }
        Some(file)
    }
}

#[async_trait]
impl PathLoader for FsPathLoader {
    async fn resolve_path(&self, path: &str) -> LoaderResult<PathResponse> {
        let Some(candidate) = self.candidate(path) else {
            debug!(path, "Rejected tile path outside root");
            return Ok(PathResponse::new(403));
        };

        let resolved = match tokio::fs::canonicalize(&candidate).await {
            Ok(resolved) => resolved,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                return Ok(PathResponse::not_found());
            },
            Err(e) => return Err(e.into()),
        };

        // Symlinks may point anywhere.
        if !resolved.starts_with(&self.root) {
            debug!(path, resolved = %resolved.display(), "Tile path escapes root");
            return Ok(PathResponse::new(403));
        }

        if tokio::fs::metadata(&resolved).await?.is_dir() {
            return Ok(PathResponse::not_found());
        }

        let body = tokio::fs::read(&resolved).await?;
        let length = body.len();
        Ok(PathResponse::ok(body)
            .with_header("content-type", content_type(&resolved))
            .with_header("content-length", length.to_string()))
    }
}

fn content_type(path: &Path) -> String {
    let guessed = MimeGuess::from_path(path).first_or_octet_stream();
    if guessed.type_() == mime::TEXT && guessed.get_param(mime::CHARSET).is_none() {
        format!("{guessed}; charset=utf-8")
    } else {
        guessed.to_string()
    }
}
