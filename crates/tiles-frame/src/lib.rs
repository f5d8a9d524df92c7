//! Tiles Frame - the outward-facing side of a tile embedding.
//!
//! A [`Frame`] turns a tile source into a running tile: it resolves the
//! source through a shared [`LoaderRegistry`](tiles_loader::LoaderRegistry),
//! asks its host's [`Embedder`] for an inner embedding, then walks the
//! Shuttle and Worker through the load handshake. Once ready it answers the
//! Worker's resource requests from the tile's path loader.
//!
//! This crate provides:
//! - [`Frame`] and its [`FrameState`] lifecycle
//! - [`MessageHub`], the shared upward channel embeddings post into
//! - The [`Embedder`] and [`ShuttlePort`] host seams, with the in-process
//!   [`ChannelEmbedder`]
//! - [`FrameEvent`]s for the host
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tiles_frame::{ChannelEmbedder, Frame, FrameEvent, MessageHub};
//! use tiles_loader::{FsLoader, LoaderRegistry};
//!
//! # async fn example() -> tiles_frame::FrameResult<()> {
//! let registry = Arc::new(LoaderRegistry::new());
//! registry.register(Arc::new(FsLoader::new()));
//!
//! let hub = MessageHub::new();
//! let (embedder, _embeddings) = ChannelEmbedder::new();
//! let mut frame = Frame::new(registry, Arc::new(embedder));
//! let mut events = frame.subscribe();
//!
//! frame.set_src("/srv/tiles/clock").await?;
//! frame.connect(&hub).await?;
//! tokio::spawn(async move { frame.run().await });
//!
//! while let Some(event) = events.recv().await {
//!     if event == FrameEvent::Loaded {
//!         break;
//!     }
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

mod config;
mod embed;
mod error;
mod event;
mod frame;
mod hub;
mod proxy;
mod state;

pub use config::{
    DEFAULT_EVENT_CAPACITY, DEFAULT_LOAD_ORIGIN, DEFAULT_TRANSPORT_CAPACITY, FrameConfig,
};
pub use embed::{ChannelEmbedder, EmbedRequest, Embedder, Embedding, ShuttlePort};
pub use error::{FrameError, FrameResult};
pub use event::{FrameEvent, FrameEventReceiver, FrameEvents};
pub use frame::Frame;
pub use hub::{HubReceiver, Inbound, MessageHub};
pub use state::FrameState;
