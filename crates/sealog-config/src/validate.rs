//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Log formats the telemetry layer understands.
pub const LOG_FORMATS: &[&str] = &["pretty", "compact", "json"];

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    require_path("storage.path", &config.storage.path)?;
    require_path("keys.path", &config.keys.path)?;
    validate_logging(config)?;
    validate_replay(config)?;
    Ok(())
}

fn require_path(field: &str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: field.to_owned(),
            message: "path must not be empty".to_owned(),
        });
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let logging = &config.logging;

    if logging.level.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: "level must not be empty".to_owned(),
        });
    }

    if !LOG_FORMATS.contains(&logging.format.to_ascii_lowercase().as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unknown format '{}'; expected one of: {}",
                logging.format,
                LOG_FORMATS.join(", ")
            ),
        });
    }
    Ok(())
}

fn validate_replay(config: &Config) -> ConfigResult<()> {
    let multiplier = config.replay.anomaly_multiplier;
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return Err(ConfigError::ValidationError {
            field: "replay.anomaly_multiplier".to_owned(),
            message: format!("multiplier {multiplier} must be a positive number"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::defaults;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&defaults().unwrap()).is_ok());
    }

    #[test]
    fn test_empty_path_rejected() {
        let mut config = defaults().unwrap();
        config.storage.path = "  ".to_owned();
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "storage.path"));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let mut config = defaults().unwrap();
        config.logging.format = "xml".to_owned();
        assert!(validate(&config).is_err());

        config.logging.format = "JSON".to_owned();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_non_positive_multiplier_rejected() {
        let mut config = defaults().unwrap();
        for bad in [0.0, -1.0, f64::NAN] {
            config.replay.anomaly_multiplier = bad;
            assert!(validate(&config).is_err());
        }
    }
}
