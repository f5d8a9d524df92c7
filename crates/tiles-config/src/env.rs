//! Environment variable fallbacks.
//!
//! A variable only applies to a field no config file has set.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::merge::{ConfigLayer, FieldSources};

/// Prefix of every variable this crate reads.
pub const ENV_PREFIX: &str = "TILES_";

/// Variable name, dotted field path, and whether the value is an integer.
const FALLBACKS: &[(&str, &str, bool)] = &[
    ("TILES_LOAD_ORIGIN", "frame.load_origin", false),
    ("TILES_LOG_LEVEL", "logging.level", false),
    ("TILES_LOG_FORMAT", "logging.format", false),
    ("TILES_REQUEST_TIMEOUT_SECS", "worker.request_timeout_secs", true),
];

/// Snapshot the `TILES_*` variables of the current process.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(ENV_PREFIX))
        .collect()
}

/// Apply fallbacks for fields still at their default. Returns how many were
/// applied.
pub fn apply_env_fallbacks(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env: &HashMap<String, String>,
) -> usize {
    let mut applied: usize = 0;
    for &(var, field, integer) in FALLBACKS {
        let Some(raw) = env.get(var) else {
            continue;
        };
        if sources
            .get(field)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults)
        {
            debug!(var, field, "config file value takes precedence over env");
            continue;
        }

        let value = if integer {
            match raw.trim().parse::<i64>() {
                Ok(n) => toml::Value::Integer(n),
                Err(_) => {
                    warn!(var, value = %raw, "ignoring non-integer env value");
                    continue;
                },
            }
        } else {
            toml::Value::String(raw.clone())
        };

        if set_path(merged, field, value) {
            sources.insert(field.to_owned(), ConfigLayer::Env(var.to_owned()));
            applied = applied.saturating_add(1);
        }
    }
    applied
}

/// Set a dotted path, creating intermediate tables.
fn set_path(root: &mut toml::Value, path: &str, value: toml::Value) -> bool {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return false;
    };
    let mut current = root;
    for segment in segments {
        let Some(table) = current.as_table_mut() else {
            return false;
        };
        current = table
            .entry(segment)
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }
    match current.as_table_mut() {
        Some(table) => {
            table.insert(leaf.to_owned(), value);
            true
        },
        None => false,
    }
}
