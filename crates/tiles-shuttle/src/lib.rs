//! Tiles Shuttle - reference inner contexts for in-process embeddings.
//!
//! The Frame never trusts what runs inside an embedding. This crate is the
//! well-behaved counterpart used by the CLI and the end-to-end tests: a
//! [`Shuttle`] that relays between the Frame and a Worker, and a
//! [`WorkerClient`] that fetches tile resources through the Frame.
//!
//! # Example
//!
//! ```rust,no_run
//! use tiles_frame::{ChannelEmbedder, MessageHub};
//! use tiles_shuttle::{Shuttle, WorkerConfig};
//!
//! # async fn example() -> tiles_shuttle::ShuttleResult<()> {
//! let hub = MessageHub::new();
//! let (embedder, mut embeddings) = ChannelEmbedder::new();
//! // ... hand `embedder` to a Frame connected to `hub` and set its source ...
//!
//! let embedding = embeddings.recv().await.unwrap();
//! let mut shuttle = Shuttle::spawn(embedding, hub.clone(), WorkerConfig::default());
//! let worker = shuttle.worker().await?;
//! let index = worker.fetch("/").await?;
//! println!("{} bytes", index.body.len());
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
mod error;
mod shuttle;
mod worker;

pub use config::{DEFAULT_REQUEST_TIMEOUT, WorkerConfig};
pub use error::{ShuttleError, ShuttleResult};
pub use shuttle::{Shuttle, ShuttleHandle, ShuttleView};
pub use worker::WorkerClient;
