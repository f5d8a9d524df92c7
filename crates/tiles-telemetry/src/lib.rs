//! Logging for tiles hosts.
//!
//! Every tiles crate logs through `tracing`. This crate installs the
//! subscriber: an `EnvFilter` built from a level plus per-crate
//! directives, one of four output formats, and stdout, stderr or rolling
//! file output.
//!
//! # Example
//!
//! ```rust,no_run
//! use tiles_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), tiles_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Json)
//!     .with_directive("tiles_frame=debug");
//!
//! setup_logging(&config)?;
//! tracing::info!("Host started");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
