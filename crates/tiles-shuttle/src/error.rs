//! Shuttle and Worker error types.

use std::time::Duration;

use thiserror::Error;
use tiles_protocol::RequestId;

/// Errors surfaced to code running inside a reference embedding.
#[derive(Debug, Error)]
pub enum ShuttleError {
    /// The Worker went away before answering.
    #[error("worker closed")]
    WorkerClosed,

    /// No response arrived in time.
    #[error("request {request_id} timed out after {timeout:?}")]
    Timeout {
        /// The unanswered request.
        request_id: RequestId,
        /// How long we waited.
        timeout: Duration,
    },

    /// The embedding was unloaded before the Worker became ready.
    #[error("shuttle unloaded")]
    Unloaded,

    /// The Shuttle task panicked or was cancelled.
    #[error("shuttle task failed: {0}")]
    Task(String),
}

/// Result type for Shuttle and Worker operations.
pub type ShuttleResult<T> = Result<T, ShuttleError>;
