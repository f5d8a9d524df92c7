//! Configuration types.
//!
//! These types mirror the settings of the runtime crates without depending
//! on them; hosts convert at the boundary. Every section implements
//! [`Default`] so a bare `[section]` header yields a working configuration.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Frame settings.
    pub frame: FrameSection,
    /// Reference Worker settings.
    pub worker: WorkerSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

/// Frame settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSection {
    /// Origin every Shuttle embedding is loaded from. Must be an `http` or
    /// `https` URL.
    pub load_origin: String,
    /// Capacity of the host-facing event channel.
    pub event_capacity: usize,
    /// Capacity of the shared upward message channel.
    pub transport_capacity: usize,
}

impl Default for FrameSection {
    fn default() -> Self {
        Self {
            load_origin: "http://shuttle.tiles.localhost/".to_owned(),
            event_capacity: 64,
            transport_capacity: 1024,
        }
    }
}

/// Reference Worker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSection {
    /// Seconds a Worker waits for a response before giving up.
    pub request_timeout_secs: u64,
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
        }
    }
}

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["tiles_frame=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
