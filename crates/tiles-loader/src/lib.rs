//! Tiles Loader - turning a tile source into a manifest and a path loader.
//!
//! This crate provides:
//! - The [`Loader`] and [`PathLoader`] traits that resolution strategies implement
//! - [`LoaderRegistry`], the ordered first-match-wins list of loaders
//! - [`Manifest`], the subset of a tile manifest the runtime acts on
//! - [`canonical_path`], the normalization every tile path goes through
//! - [`FsLoader`], a loader for tiles unpacked in a local directory
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tiles_loader::{FsLoader, LoaderRegistry};
//!
//! # async fn example() -> tiles_loader::LoaderResult<()> {
//! let registry = LoaderRegistry::new();
//! registry.register(Arc::new(FsLoader::new()));
//!
//! if let Some(tile) = registry.resolve("file:///srv/tiles/clock").await? {
//!     println!("loaded {:?}", tile.manifest.title());
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod fs;
mod loader;
mod manifest;
mod path;
mod registry;

pub use error::{LoaderError, LoaderResult};
pub use fs::{FsLoader, FsPathLoader, MANIFEST_FILE_NAME};
pub use loader::{Loader, PathLoader, TileData};
pub use manifest::{IconDescriptor, Manifest};
pub use path::{SYNTHETIC_BASE, canonical_path};
pub use registry::LoaderRegistry;
