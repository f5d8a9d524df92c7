//! Mock loaders for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tiles_loader::{Loader, LoaderError, LoaderResult, Manifest, PathLoader, TileData};
use tiles_protocol::PathResponse;

/// What a [`MockLoader`] does when asked to load.
#[derive(Clone)]
enum Outcome {
    Decline,
    Tile(TileData),
    Fail(String),
}

/// Mock implementation of the [`Loader`] trait.
///
/// Declines every source until configured otherwise. Counts calls and
/// records the sources it was asked about.
#[derive(Clone)]
pub struct MockLoader {
    name: String,
    outcome: Outcome,
    only: Option<String>,
    calls: Arc<AtomicUsize>,
    sources: Arc<Mutex<Vec<String>>>,
}

impl MockLoader {
    /// Create a loader that declines everything.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: Outcome::Decline,
            only: None,
            calls: Arc::new(AtomicUsize::new(0)),
            sources: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Claim sources with this manifest and path loader.
    #[must_use]
    pub fn with_tile(mut self, manifest: Manifest, path_loader: Arc<dyn PathLoader>) -> Self {
        self.outcome = Outcome::Tile(TileData::new(manifest, path_loader));
        self
    }

    /// Claim sources with this manifest and an empty [`MockPathLoader`].
    #[must_use]
    pub fn with_manifest(self, manifest: Manifest) -> Self {
        self.with_tile(manifest, Arc::new(MockPathLoader::new()))
    }

    /// Fail every load with this message.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.outcome = Outcome::Fail(message.into());
        self
    }

    /// Only act on this exact source and decline all others.
    #[must_use]
    pub fn only_for(mut self, source: impl Into<String>) -> Self {
        self.only = Some(source.into());
        self
    }

    /// How many times `load` was called.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Sources passed to `load`, in call order.
    #[must_use]
    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Loader for MockLoader {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self, source: &str) -> LoaderResult<Option<TileData>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.sources.lock() {
            guard.push(source.to_string());
        }

        if self.only.as_deref().is_some_and(|only| only != source) {
            return Ok(None);
        }
        match &self.outcome {
            Outcome::Decline => Ok(None),
            Outcome::Tile(tile) => Ok(Some(tile.clone())),
            Outcome::Fail(message) => Err(LoaderError::Failed {
                loader: self.name.clone(),
                source_id: source.to_string(),
                message: message.clone(),
            }),
        }
    }
}

/// Mock implementation of the [`PathLoader`] trait.
///
/// Serves a fixed table of responses and `404` for everything else.
/// Records every path it resolves.
#[derive(Debug, Clone, Default)]
pub struct MockPathLoader {
    responses: HashMap<String, PathResponse>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockPathLoader {
    /// Create an empty path loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` for `path`.
    #[must_use]
    pub fn with_response(mut self, path: impl Into<String>, response: PathResponse) -> Self {
        self.responses.insert(path.into(), response);
        self
    }

    /// Serve a `200` text body for `path`.
    #[must_use]
    pub fn with_text(self, path: impl Into<String>, body: impl Into<String>) -> Self {
        let body: String = body.into();
        self.with_response(
            path,
            PathResponse::ok(body.into_bytes()).with_header("content-type", "text/plain"),
        )
    }

    /// Fail resolution of `path` with a loader error.
    #[must_use]
    pub fn failing_on(mut self, path: impl Into<String>) -> Self {
        self.failing.insert(path.into());
        self
    }

    /// Wait this long before answering `path`.
    #[must_use]
    pub fn with_delay(mut self, path: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(path.into(), delay);
        self
    }

    /// Paths passed to `resolve_path`, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PathLoader for MockPathLoader {
    async fn resolve_path(&self, path: &str) -> LoaderResult<PathResponse> {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(path.to_string());
        }
        if let Some(delay) = self.delays.get(path) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(path) {
            return Err(LoaderError::Failed {
                loader: "mock-path".to_string(),
                source_id: path.to_string(),
                message: "configured to fail".to_string(),
            });
        }
        Ok(self
            .responses
            .get(path)
            .cloned()
            .unwrap_or_else(PathResponse::not_found))
    }
}
