//! Sealog Config - Layered configuration.
//!
//! Precedence, lowest to highest:
//!
//! 1. Embedded defaults
//! 2. Config file (`--config <path>`, or `./sealog.toml` when present)
//! 3. `SEALOG_*` environment variables
//!
//! # Example
//!
//! ```rust,no_run
//! let config = sealog_config::load(None)?;
//! println!("events stored at {}", config.storage.path);
//! # Ok::<(), sealog_config::ConfigError>(())
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod loader;
mod types;
mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{DEFAULT_CONFIG_FILE, ENV_OVERRIDES, defaults, load, load_with_env};
pub use types::{Config, KeyConfig, LoggingConfig, ReplayConfig, StorageConfig};
pub use validate::{LOG_FORMATS, validate};
