//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tiles_protocol::prelude::*;` to import all essential types.

// Identifiers
pub use crate::{InstanceId, RequestId};

// Messages
pub use crate::{Action, Envelope, Message, PathResponse, WorkerRequest, WorkerResponse};

// Errors
pub use crate::{ProtocolError, ProtocolResult};
