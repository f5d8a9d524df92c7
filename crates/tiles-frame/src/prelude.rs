//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tiles_frame::prelude::*;` to import all essential types.

// Frame and lifecycle
pub use crate::{Frame, FrameConfig, FrameEvent, FrameState};

// Host seams and transport
pub use crate::{ChannelEmbedder, Embedder, Embedding, Inbound, MessageHub, ShuttlePort};

// Errors
pub use crate::{FrameError, FrameResult};
