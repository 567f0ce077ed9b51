//! Prelude module - commonly used types for convenient import.
//!
//! Use `use sealog_telemetry::prelude::*;` to import all essential types.

// Errors
pub use crate::{TelemetryError, TelemetryResult};

// Logging configuration
pub use crate::{FileRotation, LogConfig, LogFormat, LogTarget};

// Setup functions
pub use crate::{session_span, setup_default_logging, setup_logging};
