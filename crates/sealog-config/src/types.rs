//! Configuration types.

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Event storage.
    pub storage: StorageConfig,
    /// HMAC key location.
    pub keys: KeyConfig,
    /// Logging.
    pub logging: LoggingConfig,
    /// Replay analysis tuning.
    pub replay: ReplayConfig,
}

/// Event storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path of the JSON-lines event log.
    pub path: String,
}

/// Key settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyConfig {
    /// Path of the HMAC key file.
    pub path: String,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level filter, e.g. `info` or `sealog_audit=debug`.
    pub level: String,
    /// One of `pretty`, `compact`, `json`.
    pub format: String,
}

/// Replay analysis settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayConfig {
    /// Latency threshold as a multiple of the session mean.
    pub anomaly_multiplier: f64,
    /// Detection runs only with more interactions than this.
    pub min_interactions: usize,
}
