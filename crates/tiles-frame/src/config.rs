//! Frame configuration.

use url::Url;

/// Where inner embeddings are pointed when nothing else is configured.
pub const DEFAULT_LOAD_ORIGIN: &str = "http://shuttle.tiles.localhost/";

/// Default capacity of the host-facing event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Default capacity of the shared upward transport.
pub const DEFAULT_TRANSPORT_CAPACITY: usize = 1024;

/// Settings for a [`Frame`](crate::Frame).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Fixed origin every Shuttle embedding is loaded from.
    pub load_origin: Url,
    /// Capacity of the host-facing event channel.
    pub event_capacity: usize,
    /// Capacity of the [`MessageHub`](crate::MessageHub) a host builds for
    /// its frames.
    pub transport_capacity: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            load_origin: default_load_origin(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            transport_capacity: DEFAULT_TRANSPORT_CAPACITY,
        }
    }
}

impl FrameConfig {
    /// Override the load origin.
    #[must_use]
    pub fn with_load_origin(mut self, origin: Url) -> Self {
        self.load_origin = origin;
        self
    }

    /// Override the event channel capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Override the transport capacity.
    #[must_use]
    pub fn with_transport_capacity(mut self, capacity: usize) -> Self {
        self.transport_capacity = capacity;
        self
    }
}

#[allow(clippy::expect_used)]
fn default_load_origin() -> Url {
    Url::parse(DEFAULT_LOAD_ORIGIN).expect("default load origin is a valid URL")
}
