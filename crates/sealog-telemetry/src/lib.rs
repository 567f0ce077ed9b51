//! Sealog Telemetry - Logging for the Sealog event log.
//!
//! This crate provides:
//! - Configurable logging setup with multiple formats and targets
//! - A session span so every record of one run shares a correlation field
//!
//! # Example
//!
//! ```rust,no_run
//! use sealog_core::SessionId;
//! use sealog_telemetry::{LogConfig, LogFormat, session_span, setup_logging};
//!
//! # fn main() -> Result<(), sealog_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("sealog_audit=trace");
//! setup_logging(&config)?;
//!
//! let span = session_span(&SessionId::new());
//! let _guard = span.enter();
//! tracing::info!("Recording session");
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
    FileRotation, LogConfig, LogFormat, LogTarget, session_span, setup_default_logging,
    setup_logging,
};
