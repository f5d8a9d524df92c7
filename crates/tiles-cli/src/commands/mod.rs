//! Subcommand implementations.

pub(crate) mod fetch;
pub(crate) mod inspect;

use std::sync::Arc;

use tiles_loader::{FsLoader, LoaderRegistry};

/// Registry with the loaders the CLI understands.
pub(crate) fn default_registry() -> Arc<LoaderRegistry> {
    let registry = Arc::new(LoaderRegistry::new());
    registry.register(Arc::new(FsLoader::new()));
    registry
}
