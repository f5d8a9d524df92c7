//! Host-facing frame events.

use tiles_protocol::RequestId;
use tokio::sync::broadcast;
use tracing::{trace, warn};

/// Something a host may want to react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// The handshake completed and metadata has been applied.
    Loaded,
    /// The manifest supplied a title.
    TitleChanged(String),
    /// A worker request could not be resolved.
    ///
    /// The Worker still receives a `500` for it.
    RequestFailed {
        /// The request that failed.
        request_id: RequestId,
        /// What went wrong.
        message: String,
    },
}

impl FrameEvent {
    /// Short name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::TitleChanged(_) => "title-changed",
            Self::RequestFailed { .. } => "request-failed",
        }
    }
}

/// Broadcast channel carrying [`FrameEvent`]s to every subscriber.
#[derive(Debug, Clone)]
pub struct FrameEvents {
    sender: broadcast::Sender<FrameEvent>,
}

impl FrameEvents {
    /// Create a channel holding up to `capacity` undelivered events.
    ///
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Returns how many subscribers received it.
    pub fn publish(&self, event: FrameEvent) -> usize {
        trace!(event = event.kind(), "Publishing frame event");
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> FrameEventReceiver {
        FrameEventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving half of [`FrameEvents`].
#[derive(Debug)]
pub struct FrameEventReceiver {
    receiver: broadcast::Receiver<FrameEvent>,
}

impl FrameEventReceiver {
    /// Wait for the next event.
    ///
    /// Returns `None` once the frame is gone. Lagging skips the oldest
    /// events and keeps going.
    pub async fn recv(&mut self) -> Option<FrameEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "Frame event receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Take an already delivered event without waiting.
    pub fn try_recv(&mut self) -> Option<FrameEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "Frame event receiver lagged, events dropped");
                },
                Err(_) => return None,
            }
        }
    }
}
