//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tiles_loader::prelude::*;` to import all essential types.

// Traits
pub use crate::{Loader, PathLoader};

// Registry and tile data
pub use crate::{LoaderRegistry, Manifest, TileData};

// Errors
pub use crate::{LoaderError, LoaderResult};
