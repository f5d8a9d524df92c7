//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tiles_shuttle::prelude::*;` to import all essential types.

pub use crate::{Shuttle, ShuttleError, ShuttleHandle, ShuttleResult, WorkerClient, WorkerConfig};
