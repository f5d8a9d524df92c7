//! The action tag catalogue.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// Which context a tag is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Consumed by the Shuttle (or produced by it for the Frame).
    Shuttle,
    /// Consumed by the Worker (or produced by it for the Frame).
    Worker,
    /// Warning or error reports from any context.
    Diagnostic,
}

/// Which way a tag travels relative to the Frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Frame towards Shuttle/Worker.
    Down,
    /// Shuttle/Worker towards Frame.
    Up,
}

/// Every action tag the protocol knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// `shuttle-load`
    ShuttleLoad,
    /// `shuttle-ready`
    ShuttleReady,
    /// `shuttle-set-title`
    ShuttleSetTitle,
    /// `shuttle-set-icon`
    ShuttleSetIcon,
    /// `shuttle-unload`
    ShuttleUnload,
    /// `worker-load`
    WorkerLoad,
    /// `worker-ready`
    WorkerReady,
    /// `worker-request`
    WorkerRequest,
    /// `worker-response`
    WorkerResponse,
    /// `tiles-warn`
    Warn,
    /// `tiles-error`
    Error,
}

impl Action {
    /// The full catalogue, in wire-table order.
    pub const ALL: [Action; 11] = [
        Action::ShuttleLoad,
        Action::ShuttleReady,
        Action::ShuttleSetTitle,
        Action::ShuttleSetIcon,
        Action::ShuttleUnload,
        Action::WorkerLoad,
        Action::WorkerReady,
        Action::WorkerRequest,
        Action::WorkerResponse,
        Action::Warn,
        Action::Error,
    ];

    /// The wire string for this tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ShuttleLoad => "shuttle-load",
            Self::ShuttleReady => "shuttle-ready",
            Self::ShuttleSetTitle => "shuttle-set-title",
            Self::ShuttleSetIcon => "shuttle-set-icon",
            Self::ShuttleUnload => "shuttle-unload",
            Self::WorkerLoad => "worker-load",
            Self::WorkerReady => "worker-ready",
            Self::WorkerRequest => "worker-request",
            Self::WorkerResponse => "worker-response",
            Self::Warn => "tiles-warn",
            Self::Error => "tiles-error",
        }
    }

    /// The namespace partition this tag belongs to.
    #[must_use]
    pub fn channel(self) -> Channel {
        match self {
            Self::ShuttleLoad
            | Self::ShuttleReady
            | Self::ShuttleSetTitle
            | Self::ShuttleSetIcon
            | Self::ShuttleUnload => Channel::Shuttle,
            Self::WorkerLoad | Self::WorkerReady | Self::WorkerRequest | Self::WorkerResponse => {
                Channel::Worker
            },
            Self::Warn | Self::Error => Channel::Diagnostic,
        }
    }

    /// The direction this tag is allowed to travel.
    #[must_use]
    pub fn direction(self) -> Direction {
        match self {
            Self::ShuttleLoad
            | Self::ShuttleSetTitle
            | Self::ShuttleSetIcon
            | Self::ShuttleUnload
            | Self::WorkerLoad
            | Self::WorkerResponse => Direction::Down,
            Self::ShuttleReady
            | Self::WorkerReady
            | Self::WorkerRequest
            | Self::Warn
            | Self::Error => Direction::Up,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownAction(s.to_string()))
    }
}
