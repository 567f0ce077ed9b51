//! Bridge from the file configuration to the library settings types.

use sealog_config::Config;
use sealog_replay::AnomalyPolicy;
use sealog_telemetry::{LogConfig, LogFormat};

/// Logging settings from config.
pub(crate) fn to_log_config(config: &Config) -> anyhow::Result<LogConfig> {
    let format: LogFormat = config.logging.format.parse()?;
    Ok(LogConfig::new(config.logging.level.clone()).with_format(format))
}

/// Anomaly policy from config.
pub(crate) fn to_anomaly_policy(config: &Config) -> AnomalyPolicy {
    AnomalyPolicy {
        min_interactions: config.replay.min_interactions,
        latency_multiplier: config.replay.anomaly_multiplier,
    }
}
