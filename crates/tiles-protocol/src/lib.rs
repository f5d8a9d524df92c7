//! Tiles Protocol - the message contract between the three tile contexts.
//!
//! A tile runs two sandboxes deep. The outward-facing `Frame` talks to a
//! `Shuttle`, which relays to a `Worker` sitting next to the tile code.
//! Everything that crosses those boundaries is an [`Envelope`]: the
//! instance identifier of the embedding it belongs to, plus one
//! [`Message`] variant per action tag.
//!
//! This crate provides:
//! - [`InstanceId`] and [`RequestId`] correlation tokens
//! - The [`Action`] tag catalogue and its direction/channel partition
//! - [`Envelope`] JSON encoding and decoding
//! - [`PathResponse`], the only resource shape a Worker ever receives
//!
//! # Example
//!
//! ```
//! use tiles_protocol::{Envelope, InstanceId, Message};
//!
//! let id = InstanceId::generate();
//! let envelope = Envelope::new(id.clone(), Message::ShuttleLoad { id: id.clone() });
//!
//! let wire = envelope.encode().unwrap();
//! let decoded = Envelope::decode(&wire).unwrap();
//! assert!(decoded.id.matches(&id));
//! assert_eq!(decoded.action().as_str(), "shuttle-load");
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod action;
mod envelope;
mod error;
mod id;
mod message;
mod response;

pub use action::{Action, Channel, Direction};
pub use envelope::{Envelope, MAX_ENVELOPE_BYTES};
pub use error::{ProtocolError, ProtocolResult};
pub use id::{INSTANCE_ID_BYTES, InstanceId, RequestId};
pub use message::{Message, ResolvePathRequest, WorkerRequest, WorkerResponse};
pub use response::PathResponse;
