//! Tiles Test - shared test utilities for the tiles workspace.
//!
//! This crate provides mock loaders and fixtures that can be used across
//! the tiles crates as a dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! tiles-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tiles_loader::LoaderRegistry;
//! use tiles_test::{MockLoader, MockPathLoader, test_manifest};
//!
//! #[tokio::test]
//! async fn test_resolves_mock_tile() {
//!     let path_loader = Arc::new(MockPathLoader::new().with_text("/", "hi"));
//!     let loader = MockLoader::new("mock").with_tile(test_manifest(), path_loader);
//!
//!     let registry = LoaderRegistry::new();
//!     registry.register(Arc::new(loader));
//!     assert!(registry.resolve("anything").await.unwrap().is_some());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
