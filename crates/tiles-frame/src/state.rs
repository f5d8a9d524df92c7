//! Frame lifecycle states.

use std::fmt;

/// Where a frame is in the embedding handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameState {
    /// No embedding.
    Idle,
    /// Resolving the source through the loader registry.
    AwaitingManifest,
    /// Inner embedding created, waiting for it to report content loaded.
    Embedded,
    /// `shuttle-load` sent.
    AwaitingShuttleReady,
    /// `worker-load` sent.
    AwaitingWorkerReady,
    /// Handshake complete; worker requests are served.
    Ready,
}

impl FrameState {
    /// Whether the instance has reached the point where worker requests are
    /// served.
    #[must_use]
    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::AwaitingManifest => "awaiting-manifest",
            Self::Embedded => "embedded",
            Self::AwaitingShuttleReady => "awaiting-shuttle-ready",
            Self::AwaitingWorkerReady => "awaiting-worker-ready",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}
