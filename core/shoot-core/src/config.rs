//! Configuration loading and saving.
//!
//! `config.json` is optional. Missing fields take defaults, and a missing or
//! unreadable file yields the default configuration rather than an error.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shoot_glance_protocol::DEFAULT_NAMESPACE;
use tracing::warn;

use crate::boot::STARTUP_TIMEOUT;
use crate::error::{Result, ShootError};
use crate::storage::{atomic_write, StorageConfig};

pub const DEFAULT_TAG_GROUP: &str = "General";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShootConfig {
    /// Upper bound for the durable store bootstrap before safe mode.
    pub boot_timeout_secs: u64,
    /// Host tick cadence; also the glance publish cadence while running.
    pub tick_interval_ms: u64,
    /// Label used for tags saved without a group.
    pub default_tag_group: String,
    pub glance_namespace: String,
}

impl Default for ShootConfig {
    fn default() -> Self {
        Self {
            boot_timeout_secs: STARTUP_TIMEOUT.as_secs(),
            tick_interval_ms: 1_000,
            default_tag_group: DEFAULT_TAG_GROUP.to_string(),
            glance_namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl ShootConfig {
    pub fn boot_timeout(&self) -> Duration {
        Duration::from_secs(self.boot_timeout_secs.max(1))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(100))
    }
}

/// Loads the configuration, returning defaults if the file is missing or malformed.
pub fn load_config(storage: &StorageConfig) -> ShootConfig {
    let path = storage.config_file();
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return ShootConfig::default(),
        Err(err) => {
            warn!(error = %err, path = %path.display(), "Failed to read config; using defaults");
            return ShootConfig::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, path = %path.display(), "Malformed config; using defaults");
            ShootConfig::default()
        }
    }
}

/// Saves the configuration to disk.
pub fn save_config(storage: &StorageConfig, config: &ShootConfig) -> Result<()> {
    let content = serde_json::to_string_pretty(config).map_err(|e| ShootError::Json {
        context: "serializing config".to_string(),
        source: e,
    })?;
    atomic_write(&storage.config_file(), &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = tempdir().expect("temp dir");
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        let config = load_config(&storage);
        assert_eq!(config, ShootConfig::default());
        assert_eq!(config.boot_timeout(), Duration::from_secs(5));
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempdir().expect("temp dir");
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        std::fs::write(storage.config_file(), r#"{"default_tag_group": "Weddings"}"#)
            .expect("write");

        let config = load_config(&storage);
        assert_eq!(config.default_tag_group, "Weddings");
        assert_eq!(config.boot_timeout_secs, 5);
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let temp = tempdir().expect("temp dir");
        let storage = StorageConfig::with_root(temp.path().to_path_buf());
        std::fs::write(storage.config_file(), "not json").expect("write");
        assert_eq!(load_config(&storage), ShootConfig::default());
    }

    #[test]
    fn save_then_load() {
        let temp = tempdir().expect("temp dir");
        let storage = StorageConfig::with_root(temp.path().join("root"));
        let config = ShootConfig {
            boot_timeout_secs: 9,
            ..ShootConfig::default()
        };
        save_config(&storage, &config).expect("save");
        assert_eq!(load_config(&storage), config);
    }

    #[test]
    fn zero_intervals_are_clamped() {
        let config = ShootConfig {
            boot_timeout_secs: 0,
            tick_interval_ms: 0,
            ..ShootConfig::default()
        };
        assert_eq!(config.boot_timeout(), Duration::from_secs(1));
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
    }
}
