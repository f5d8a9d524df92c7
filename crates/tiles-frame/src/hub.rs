//! The shared upward channel.
//!
//! Every embedding posts into one [`MessageHub`]. Each connected frame holds
//! its own subscription and sees everything, so identity filtering happens
//! at the frame.

use std::sync::Arc;

use tiles_protocol::{Envelope, InstanceId};
use tokio::sync::broadcast;
use tracing::{trace, warn};

use crate::config::DEFAULT_TRANSPORT_CAPACITY;

/// Something arriving from inside an embedding.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// The host finished loading the Shuttle document of this embedding.
    ContentLoaded {
        /// Instance the embedding was created for.
        id: InstanceId,
    },
    /// A decoded protocol message.
    Message(Envelope),
    /// A message still in its JSON encoding, as posted by an untrusted
    /// context.
    Wire(String),
}

impl From<Envelope> for Inbound {
    fn from(envelope: Envelope) -> Self {
        Self::Message(envelope)
    }
}

/// Broadcast channel shared by every embedding of a host.
#[derive(Debug, Clone)]
pub struct MessageHub {
    sender: broadcast::Sender<Arc<Inbound>>,
    capacity: usize,
}

impl Default for MessageHub {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageHub {
    /// Create a hub with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TRANSPORT_CAPACITY)
    }

    /// Create a hub buffering up to `capacity` messages per subscriber.
    ///
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Post a message. Returns how many subscribers received it.
    pub fn post(&self, inbound: impl Into<Inbound>) -> usize {
        let inbound = Arc::new(inbound.into());
        self.sender.send(inbound).unwrap_or_else(|_| {
            trace!("No subscribers on message hub");
            0
        })
    }

    /// Subscribe to messages posted from now on.
    #[must_use]
    pub fn subscribe(&self) -> HubReceiver {
        HubReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Per-subscriber buffer size.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// A frame's subscription to a [`MessageHub`].
#[derive(Debug)]
pub struct HubReceiver {
    receiver: broadcast::Receiver<Arc<Inbound>>,
}

impl HubReceiver {
    /// Wait for the next message.
    ///
    /// Returns `None` when every hub handle is gone.
    pub async fn recv(&mut self) -> Option<Arc<Inbound>> {
        loop {
            match self.receiver.recv().await {
                Ok(inbound) => return Some(inbound),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "Hub receiver lagged, messages dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take an already posted message without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<Inbound>> {
        loop {
            match self.receiver.try_recv() {
                Ok(inbound) => return Some(inbound),
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "Hub receiver lagged, messages dropped");
                },
                Err(_) => return None,
            }
        }
    }
}
