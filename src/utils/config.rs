use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::core::{DEFAULT_CYCLE_INTERVAL_MS, POSITION_DECIMALS};

/// Upper bound accepted for the cycle interval (one hour)
const MAX_CYCLE_INTERVAL_MS: u64 = 3_600_000;

/// Engine configuration, loaded from a JSON file and overridden from the command line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay between estimation cycles (milliseconds)
    pub cycle_interval_ms: u64,
    /// Path of the JSON store document
    pub store_path: PathBuf,
    /// `tracing` filter directive used when `RUST_LOG` is not set
    pub log_filter: String,
    /// Decimal places kept for stored tag coordinates
    pub position_decimals: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cycle_interval_ms: DEFAULT_CYCLE_INTERVAL_MS,
            store_path: PathBuf::from("positioning.json"),
            log_filter: "info".to_string(),
            position_decimals: POSITION_DECIMALS,
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
}

impl EngineConfig {
    /// Load and validate configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: EngineConfig = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_interval_ms == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "cycle_interval_ms".to_string(),
                value: self.cycle_interval_ms.to_string(),
                reason: "Cycle interval must be positive".to_string(),
            });
        }

        if self.cycle_interval_ms > MAX_CYCLE_INTERVAL_MS {
            return Err(ConfigError::InvalidParameter {
                parameter: "cycle_interval_ms".to_string(),
                value: self.cycle_interval_ms.to_string(),
                reason: "Cycle interval too long for continuous tracking".to_string(),
            });
        }

        if !(0..=9).contains(&self.position_decimals) {
            return Err(ConfigError::InvalidParameter {
                parameter: "position_decimals".to_string(),
                value: self.position_decimals.to_string(),
                reason: "Stored precision must be between 0 and 9 decimals".to_string(),
            });
        }

        if self.store_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidParameter {
                parameter: "store_path".to_string(),
                value: String::new(),
                reason: "A store path is required".to_string(),
            });
        }

        Ok(())
    }

    /// Update the cycle interval with validation, returning the previous value
    pub fn set_cycle_interval_ms(&mut self, interval_ms: u64) -> Result<u64, ConfigError> {
        let old_value = self.cycle_interval_ms;
        let candidate = EngineConfig {
            cycle_interval_ms: interval_ms,
            ..self.clone()
        };
        candidate.validate()?;

        self.cycle_interval_ms = interval_ms;
        Ok(old_value)
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.cycle_interval(), Duration::from_secs(3));
        assert_eq!(config.position_decimals, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.json");
        fs::write(&path, r#"{ "cycle_interval_ms": 500, "store_path": "/var/lib/rtls/store.json" }"#).unwrap();

        let config = EngineConfig::load_from_file(&path).unwrap();
        assert_eq!(config.cycle_interval_ms, 500);
        assert_eq!(config.store_path, PathBuf::from("/var/lib/rtls/store.json"));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.json");

        let mut config = EngineConfig::default();
        config.log_filter = "tag_positioning=debug".to_string();
        config.save_to_file(&path).unwrap();

        assert_eq!(EngineConfig::load_from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("engine.json");
        fs::write(&path, r#"{ "cycle_interval_ms": 0 }"#).unwrap();

        assert!(matches!(
            EngineConfig::load_from_file(&path),
            Err(ConfigError::InvalidParameter { .. })
        ));

        let mut config = EngineConfig::default();
        assert!(config.set_cycle_interval_ms(0).is_err());
        assert_eq!(config.set_cycle_interval_ms(1000).unwrap(), DEFAULT_CYCLE_INTERVAL_MS);
    }

    #[test]
    fn test_unreadable_and_invalid_files() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            EngineConfig::load_from_file(dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));

        let path = dir.path().join("bad.json");
        fs::write(&path, "cycle_interval_ms = 3").unwrap();
        assert!(matches!(EngineConfig::load_from_file(&path), Err(ConfigError::Parse { .. })));
    }
}
