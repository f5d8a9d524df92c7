//! Post-merge configuration validation.

use url::Url;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Largest accepted channel capacity.
const MAX_CAPACITY: usize = 65_536;

/// Largest accepted Worker request timeout (one hour).
const MAX_REQUEST_TIMEOUT_SECS: u64 = 3_600;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Validate a fully merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_frame(config)?;
    validate_worker(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_frame(config: &Config) -> ConfigResult<()> {
    let f = &config.frame;

    let origin = Url::parse(&f.load_origin)
        .map_err(|e| invalid("frame.load_origin", format!("'{}' is not a URL: {e}", f.load_origin)))?;
    if !matches!(origin.scheme(), "http" | "https") {
        return Err(invalid(
            "frame.load_origin",
            format!("scheme '{}' is not supported; expected http or https", origin.scheme()),
        ));
    }
    if origin.host_str().is_none() {
        return Err(invalid("frame.load_origin", "origin must have a host"));
    }

    for (field, value) in [
        ("frame.event_capacity", f.event_capacity),
        ("frame.transport_capacity", f.transport_capacity),
    ] {
        if value == 0 || value > MAX_CAPACITY {
            return Err(invalid(
                field,
                format!("capacity {value} must be between 1 and {MAX_CAPACITY}"),
            ));
        }
    }
    Ok(())
}

fn validate_worker(config: &Config) -> ConfigResult<()> {
    let secs = config.worker.request_timeout_secs;
    if secs == 0 || secs > MAX_REQUEST_TIMEOUT_SECS {
        return Err(invalid(
            "worker.request_timeout_secs",
            format!("timeout {secs}s must be between 1 and {MAX_REQUEST_TIMEOUT_SECS}"),
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if !LOG_LEVELS.contains(&l.level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unknown level '{}'; expected one of: {}",
                l.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }
    if !LOG_FORMATS.contains(&l.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{}'; expected one of: {}",
                l.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }
    if let Some(empty) = l.directives.iter().position(|d| d.trim().is_empty()) {
        return Err(invalid(
            "logging.directives",
            format!("directive {empty} is empty"),
        ));
    }
    Ok(())
}
