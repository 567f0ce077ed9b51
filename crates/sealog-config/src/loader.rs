//! Layered loading.
//!
//! 1. Parse the embedded `defaults.toml`
//! 2. Merge the config file: the explicit path if given (must exist),
//!    otherwise `./sealog.toml` if present
//! 3. Apply `SEALOG_*` environment overrides
//! 4. Deserialize and validate

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "sealog.toml";

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: usize = 1_048_576;

/// Environment variables that override a single `section.key` field.
pub const ENV_OVERRIDES: &[(&str, &str, &str)] = &[
    ("SEALOG_STORAGE_PATH", "storage", "path"),
    ("SEALOG_KEY_PATH", "keys", "path"),
    ("SEALOG_LOG_LEVEL", "logging", "level"),
    ("SEALOG_LOG_FORMAT", "logging", "format"),
];

/// The embedded defaults alone.
///
/// # Errors
///
/// Returns an error only if the embedded file is broken.
pub fn defaults() -> ConfigResult<Config> {
    parse_defaults()?
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })
}

/// Load configuration from defaults, file, and the process environment.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a file is unreadable or malformed, an
/// override is empty, or the merged result fails validation.
pub fn load(explicit: Option<&Path>) -> ConfigResult<Config> {
    let env: HashMap<String, String> = std::env::vars()
        .filter(|(k, _)| k.starts_with("SEALOG_"))
        .collect();
    load_with_env(explicit, Path::new(DEFAULT_CONFIG_FILE), &env)
}

/// Load with an explicit environment map and fallback file location.
///
/// # Errors
///
/// See [`load`].
pub fn load_with_env(
    explicit: Option<&Path>,
    fallback: &Path,
    env: &HashMap<String, String>,
) -> ConfigResult<Config> {
    let mut merged = parse_defaults()?;

    let overlay = match explicit {
        Some(path) => Some((read_file(path)?, path)),
        None => try_read_file(fallback)?.map(|overlay| (overlay, fallback)),
    };
    if let Some((overlay, path)) = overlay {
        deep_merge(&mut merged, &overlay);
        info!(path = %path.display(), "loaded config file");
    }

    let applied = apply_env_overrides(&mut merged, env)?;
    if applied > 0 {
        debug!(count = applied, "applied environment overrides");
    }

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;
    Ok(config)
}

fn parse_defaults() -> ConfigResult<toml::Value> {
    toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
        path: "<embedded defaults>".to_owned(),
        source: e,
    })
}

fn read_file(path: &Path) -> ConfigResult<toml::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_file(path, &content)
}

/// Like [`read_file`], but a missing file is `None`.
fn try_read_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_file(path, &content).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            Ok(None)
        },
        Err(e) => Err(ConfigError::ReadError {
            path: path.display().to_string(),
            source: e,
        }),
    }
}

fn parse_file(path: &Path, content: &str) -> ConfigResult<toml::Value> {
    if content.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }
    toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })
}

/// Recursively merge `overlay` into `base`. Tables merge per key; anything
/// else in the overlay replaces the base value.
fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

fn apply_env_overrides(
    merged: &mut toml::Value,
    env: &HashMap<String, String>,
) -> ConfigResult<usize> {
    let mut applied: usize = 0;
    for &(var_name, section, key) in ENV_OVERRIDES {
        let Some(value) = env.get(var_name) else {
            continue;
        };
        if value.trim().is_empty() {
            return Err(ConfigError::EnvError {
                var_name: var_name.to_owned(),
                message: "set but empty".to_owned(),
            });
        }

        let Some(root) = merged.as_table_mut() else {
            continue;
        };
        let table = root
            .entry(section)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
        if let Some(table) = table.as_table_mut() {
            table.insert(key.to_owned(), toml::Value::String(value.clone()));
            applied = applied.saturating_add(1);
        }
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_defaults_deserialize_to_config() {
        let config = defaults().unwrap();
        assert_eq!(config.storage.path, ".sealog/events.jsonl");
        assert_eq!(config.logging.format, "compact");
        assert!((config.replay.anomaly_multiplier - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.replay.min_interactions, 3);
    }

    #[test]
    fn test_missing_fallback_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_with_env(None, &dir.path().join("sealog.toml"), &no_env()).unwrap();
        assert_eq!(config, defaults().unwrap());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_with_env(Some(&missing), &missing, &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_partial_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sealog.toml");
        std::fs::write(&path, "[replay]\nmin_interactions = 5\n").unwrap();

        let config = load_with_env(None, &path, &no_env()).unwrap();
        assert_eq!(config.replay.min_interactions, 5);
        assert!((config.replay.anomaly_multiplier - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.keys.path, ".sealog/hmac.key");
    }

    #[test]
    fn test_env_beats_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[storage]\npath = \"from-file.jsonl\"\n").unwrap();

        let env: HashMap<_, _> = [
            ("SEALOG_STORAGE_PATH".to_owned(), "from-env.jsonl".to_owned()),
            ("SEALOG_LOG_FORMAT".to_owned(), "json".to_owned()),
        ]
        .into_iter()
        .collect();

        let config = load_with_env(Some(&path), &path, &env).unwrap();
        assert_eq!(config.storage.path, "from-env.jsonl");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_empty_env_override_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let env: HashMap<_, _> = [("SEALOG_KEY_PATH".to_owned(), " ".to_owned())]
            .into_iter()
            .collect();
        let err = load_with_env(None, &dir.path().join("x.toml"), &env).unwrap_err();
        assert!(matches!(err, ConfigError::EnvError { .. }));
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[storage\npath = 1").unwrap();

        match load_with_env(Some(&path), &path, &no_env()) {
            Err(ConfigError::ParseError { path: p, .. }) => assert!(p.ends_with("bad.toml")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo.toml");
        std::fs::write(&path, "[storage]\npaht = \"x\"\n").unwrap();
        assert!(load_with_env(Some(&path), &path, &no_env()).is_err());
    }

    #[test]
    fn test_invalid_value_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sealog.toml");
        std::fs::write(&path, "[replay]\nanomaly_multiplier = 0.0\n").unwrap();
        assert!(matches!(
            load_with_env(None, &path, &no_env()),
            Err(ConfigError::ValidationError { .. })
        ));
    }
}
