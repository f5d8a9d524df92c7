//! The `{id, action, payload}` envelope.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::action::Action;
use crate::error::{ProtocolError, ProtocolResult};
use crate::id::InstanceId;
use crate::message::Message;

/// Upper bound on a single encoded envelope.
pub const MAX_ENVELOPE_BYTES: usize = 16 * 1024 * 1024;

/// A message bound to the embedding it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Instance identifier of the embedding.
    pub id: InstanceId,
    /// The tagged message.
    pub message: Message,
}

#[derive(Serialize, Deserialize)]
struct RawEnvelope {
    id: InstanceId,
    action: String,
    #[serde(default)]
    payload: Value,
}

impl Envelope {
    /// Bind a message to an instance.
    #[must_use]
    pub fn new(id: InstanceId, message: Message) -> Self {
        Self { id, message }
    }

    /// The action tag of the contained message.
    #[must_use]
    pub fn action(&self) -> Action {
        self.message.action()
    }

    /// Encode to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::TooLarge`] if the encoding exceeds
    /// [`MAX_ENVELOPE_BYTES`].
    pub fn encode(&self) -> ProtocolResult<String> {
        let raw = self.to_raw()?;
        let encoded = serde_json::to_string(&raw)?;
        check_size(encoded.len())?;
        Ok(encoded)
    }

    /// Decode from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is oversized, not an envelope, carries
    /// an unknown tag, or has a payload that does not fit the tag.
    pub fn decode(input: &str) -> ProtocolResult<Self> {
        Self::decode_slice(input.as_bytes())
    }

    /// Decode from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// See [`Envelope::decode`].
    pub fn decode_slice(input: &[u8]) -> ProtocolResult<Self> {
        check_size(input.len())?;
        let raw: RawEnvelope = serde_json::from_slice(input)?;
        Self::from_raw(raw)
    }

    fn to_raw(&self) -> ProtocolResult<RawEnvelope> {
        Ok(RawEnvelope {
            id: self.id.clone(),
            action: self.action().as_str().to_string(),
            payload: self.message.payload()?,
        })
    }

    fn from_raw(raw: RawEnvelope) -> ProtocolResult<Self> {
        let action: Action = raw.action.parse()?;
        let message = Message::from_parts(action, raw.payload)?;
        Ok(Self {
            id: raw.id,
            message,
        })
    }
}

fn check_size(size: usize) -> ProtocolResult<()> {
    if size > MAX_ENVELOPE_BYTES {
        return Err(ProtocolError::TooLarge {
            size,
            limit: MAX_ENVELOPE_BYTES,
        });
    }
    Ok(())
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_raw()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawEnvelope::deserialize(deserializer)?;
        Self::from_raw(raw).map_err(serde::de::Error::custom)
    }
}
