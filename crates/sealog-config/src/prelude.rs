//! Prelude module - commonly used types for convenient import.
//!
//! Use `use sealog_config::prelude::*;` to import all essential types.

pub use crate::{ConfigError, ConfigResult};

pub use crate::{Config, KeyConfig, LoggingConfig, ReplayConfig, StorageConfig};

pub use crate::{load, load_with_env};
