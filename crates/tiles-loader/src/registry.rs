//! Loader registry.
//!
//! Holds the ordered list of loaders a composing component consults when a
//! tile source has to be turned into tile data.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::error::LoaderResult;
use crate::loader::{Loader, TileData};

/// Ordered, first-match-wins list of loaders.
///
/// Shared between frames through an `Arc`. Registration order is
/// resolution order. Resolution iterates over a snapshot taken when it
/// starts, so registering or unregistering while a resolve is suspended
/// neither skips nor repeats a loader for that resolve.
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: RwLock<Vec<Arc<dyn Loader>>>,
}

impl LoaderRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loaders: RwLock::new(Vec::new()),
        }
    }

    /// Append a loader. It is consulted after every loader already present.
    pub fn register(&self, loader: Arc<dyn Loader>) {
        let mut loaders = self.loaders.write().unwrap_or_else(PoisonError::into_inner);
        info!(
            loader = loader.name(),
            position = loaders.len(),
            "Registered loader"
        );
        loaders.push(loader);
    }

    /// Remove every registration of this exact loader instance.
    ///
    /// Returns how many entries were removed.
    pub fn unregister(&self, loader: &Arc<dyn Loader>) -> usize {
        let mut loaders = self.loaders.write().unwrap_or_else(PoisonError::into_inner);
        let before = loaders.len();
        loaders.retain(|registered| !same_loader(registered, loader));
        let removed = before.saturating_sub(loaders.len());
        if removed > 0 {
            info!(loader = loader.name(), removed, "Unregistered loader");
        }
        removed
    }

    /// Copy of the current loader list, in resolution order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<dyn Loader>> {
        self.loaders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of the registered loaders, in resolution order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .map(|loader| loader.name().to_string())
            .collect()
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loaders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no loader is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve a source to tile data.
    ///
    /// Loaders are tried in registration order; the first `Some` wins and
    /// later loaders are not called. Returns `Ok(None)` when no loader
    /// claims the source.
    ///
    /// # Errors
    ///
    /// The first loader error is returned as is. Resolution does not fall
    /// through to the next loader on error, only on a deliberate `None`.
    pub async fn resolve(&self, source: &str) -> LoaderResult<Option<TileData>> {
        for loader in self.snapshot() {
            match loader.load(source).await {
                Ok(Some(tile)) => {
                    debug!(loader = loader.name(), source, "Loader matched source");
                    return Ok(Some(tile));
                },
                Ok(None) => {
                    debug!(loader = loader.name(), source, "Loader declined source");
                },
                Err(e) => {
                    warn!(loader = loader.name(), source, error = %e, "Loader failed");
                    return Err(e);
                },
            }
        }

        debug!(source, "No loader matched source");
        Ok(None)
    }
}

/// Instance identity, ignoring vtable pointers.
fn same_loader(a: &Arc<dyn Loader>, b: &Arc<dyn Loader>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl std::fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("loaders", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tiles_protocol::PathResponse;

    use super::*;
    use crate::error::LoaderError;
    use crate::loader::PathLoader;
    use crate::manifest::Manifest;

    struct NullPathLoader;

    #[async_trait]
    impl PathLoader for NullPathLoader {
        async fn resolve_path(&self, _path: &str) -> LoaderResult<PathResponse> {
            Ok(PathResponse::not_found())
        }
    }

    enum Behavior {
        Decline,
        Match(&'static str),
        Fail,
    }

    /// A loader that records every source it is asked about.
    struct TestLoader {
        name: &'static str,
        behavior: Behavior,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl TestLoader {
        fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                name,
                behavior,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Loader for TestLoader {
        fn name(&self) -> &str {
            self.name
        }

        async fn load(&self, source: &str) -> LoaderResult<Option<TileData>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(source.to_string());
            match self.behavior {
                Behavior::Decline => Ok(None),
                Behavior::Match(title) => Ok(Some(TileData::new(
                    Manifest::new().with_name(title),
                    Arc::new(NullPathLoader),
                ))),
                Behavior::Fail => Err(LoaderError::Failed {
                    loader: self.name.to_string(),
                    source_id: source.to_string(),
                    message: "boom".into(),
                }),
            }
        }
    }

    fn as_dyn(loader: &Arc<TestLoader>) -> Arc<dyn Loader> {
        Arc::clone(loader) as Arc<dyn Loader>
    }

    #[tokio::test]
    async fn test_first_match_wins_and_later_loaders_are_not_called() {
        let registry = LoaderRegistry::new();
        let first = TestLoader::new("first", Behavior::Decline);
        let second = TestLoader::new("second", Behavior::Match("second"));
        let third = TestLoader::new("third", Behavior::Match("third"));
        registry.register(as_dyn(&first));
        registry.register(as_dyn(&second));
        registry.register(as_dyn(&third));

        let tile = registry.resolve("x").await.unwrap().unwrap();

        assert_eq!(tile.manifest.title(), Some("second"));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 1);
        assert_eq!(third.calls(), 0);
        assert_eq!(*first.seen.lock().unwrap(), vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn test_no_match_is_none() {
        let registry = LoaderRegistry::new();
        registry.register(as_dyn(&TestLoader::new("a", Behavior::Decline)));

        assert!(registry.resolve("x").await.unwrap().is_none());
        assert!(LoaderRegistry::new().resolve("x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_error_does_not_fall_through() {
        let registry = LoaderRegistry::new();
        let failing = TestLoader::new("failing", Behavior::Fail);
        let fallback = TestLoader::new("fallback", Behavior::Match("fallback"));
        registry.register(as_dyn(&failing));
        registry.register(as_dyn(&fallback));

        let err = registry.resolve("x").await.unwrap_err();

        assert!(matches!(err, LoaderError::Failed { ref loader, .. } if loader == "failing"));
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_unregistered_loader_is_skipped() {
        let registry = LoaderRegistry::new();
        let first = TestLoader::new("first", Behavior::Match("first"));
        let second = TestLoader::new("second", Behavior::Match("second"));
        let first_dyn = as_dyn(&first);
        registry.register(Arc::clone(&first_dyn));
        registry.register(as_dyn(&second));

        assert_eq!(registry.unregister(&first_dyn), 1);
        let tile = registry.resolve("x").await.unwrap().unwrap();

        assert_eq!(tile.manifest.title(), Some("second"));
        assert_eq!(first.calls(), 0);
    }

    #[test]
    fn test_unregister_removes_every_registration() {
        let registry = LoaderRegistry::new();
        let loader = as_dyn(&TestLoader::new("dup", Behavior::Decline));
        let other = as_dyn(&TestLoader::new("other", Behavior::Decline));
        registry.register(Arc::clone(&loader));
        registry.register(Arc::clone(&other));
        registry.register(Arc::clone(&loader));

        assert_eq!(registry.unregister(&loader), 2);
        assert_eq!(registry.names(), vec!["other".to_string()]);
        assert_eq!(registry.unregister(&loader), 0);
    }

    #[test]
    fn test_identity_not_name_decides_removal() {
        let registry = LoaderRegistry::new();
        let a = as_dyn(&TestLoader::new("same", Behavior::Decline));
        let b = as_dyn(&TestLoader::new("same", Behavior::Decline));
        registry.register(Arc::clone(&a));
        registry.register(b);

        assert_eq!(registry.unregister(&a), 1);
        assert_eq!(registry.len(), 1);
    }

    /// Registers a new loader from inside `load`, the way another component
    /// could while a resolve is suspended.
    struct RegisteringLoader {
        registry: Arc<LoaderRegistry>,
        late: Arc<dyn Loader>,
    }

    #[async_trait]
    impl Loader for RegisteringLoader {
        fn name(&self) -> &str {
            "registering"
        }

        async fn load(&self, _source: &str) -> LoaderResult<Option<TileData>> {
            self.registry.register(Arc::clone(&self.late));
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_resolve_uses_snapshot() {
        let registry = Arc::new(LoaderRegistry::new());
        let late = TestLoader::new("late", Behavior::Match("late"));
        registry.register(Arc::new(RegisteringLoader {
            registry: Arc::clone(&registry),
            late: as_dyn(&late),
        }));

        assert!(registry.resolve("x").await.unwrap().is_none());
        assert_eq!(late.calls(), 0);

        let tile = registry.resolve("x").await.unwrap().unwrap();
        assert_eq!(tile.manifest.title(), Some("late"));
    }
}
