//! Protocol error types.

use thiserror::Error;

/// Errors raised while encoding or decoding envelopes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The envelope is not valid JSON or does not have the envelope shape.
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The action tag is not part of the catalogue.
    #[error("unknown action tag: {0}")]
    UnknownAction(String),

    /// The payload does not match what the action tag requires.
    #[error("invalid payload for {action}: {message}")]
    InvalidPayload {
        /// The action whose payload was rejected.
        action: &'static str,
        /// Decoder message.
        message: String,
    },

    /// The encoded envelope exceeds the transport limit.
    #[error("envelope too large: {size} bytes (limit: {limit} bytes)")]
    TooLarge {
        /// Actual size in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        limit: usize,
    },
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
