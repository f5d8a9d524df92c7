//! Bridge from `tiles_config::Config` to the runtime crates' settings.

use std::time::Duration;

use anyhow::{Context, Result};
use tiles_config::Config;
use tiles_frame::FrameConfig;
use tiles_shuttle::WorkerConfig;
use tiles_telemetry::{LogConfig, LogFormat};
use url::Url;

/// Logging settings from the `[logging]` section.
///
/// Unknown formats fall back to compact; validation has already rejected
/// them for loaded configs.
pub(crate) fn to_log_config(config: &Config) -> LogConfig {
    let format = config.logging.format.parse().unwrap_or(LogFormat::Compact);
    LogConfig::new(config.logging.level.clone())
        .with_format(format)
        .with_directives(config.logging.directives.iter().cloned())
}

/// Frame settings from the `[frame]` section.
pub(crate) fn to_frame_config(config: &Config) -> Result<FrameConfig> {
    let origin = Url::parse(&config.frame.load_origin)
        .with_context(|| format!("invalid load origin '{}'", config.frame.load_origin))?;
    Ok(FrameConfig::default()
        .with_load_origin(origin)
        .with_event_capacity(config.frame.event_capacity)
        .with_transport_capacity(config.frame.transport_capacity))
}

/// Worker settings from the `[worker]` section.
pub(crate) fn to_worker_config(config: &Config) -> WorkerConfig {
    WorkerConfig::default()
        .with_request_timeout(Duration::from_secs(config.worker.request_timeout_secs))
}
