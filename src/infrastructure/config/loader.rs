use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Control {0} cannot be empty")]
    EmptyControlField(&'static str),

    #[error("Enable and disable labels must differ, both are {0:?}")]
    IdenticalLabels(String),

    #[error("Invalid watcher_delay_ms: 0. Must be at least 1")]
    ZeroWatcherDelay,

    #[error(
        "Invalid timing: watcher_delay_ms ({0}) must be less than suppression_window_ms ({1})"
    )]
    WatcherDelayExceedsWindow(u64, u64),

    #[error("Storage key cannot be empty")]
    EmptyStorageKey,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .togglekeeper/config.yaml (project config)
    /// 3. .togglekeeper/local.yaml (local overrides, optional)
    /// 4. Environment variables (TOGGLEKEEPER_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".togglekeeper/config.yaml"))
            .merge(Yaml::file(".togglekeeper/local.yaml"))
            .merge(Env::prefixed("TOGGLEKEEPER_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring environment overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("TOGGLEKEEPER_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let control = &config.control;
        if control.element.trim().is_empty() {
            return Err(ConfigError::EmptyControlField("element"));
        }
        if control.label_attribute.trim().is_empty() {
            return Err(ConfigError::EmptyControlField("label_attribute"));
        }
        if control.enable_label.is_empty() {
            return Err(ConfigError::EmptyControlField("enable_label"));
        }
        if control.disable_label.is_empty() {
            return Err(ConfigError::EmptyControlField("disable_label"));
        }
        if control.enable_label == control.disable_label {
            return Err(ConfigError::IdenticalLabels(control.enable_label.clone()));
        }

        // The watcher has to trail a same-tick click but still land inside
        // that click's suppression window.
        let timing = &config.timing;
        if timing.watcher_delay_ms == 0 {
            return Err(ConfigError::ZeroWatcherDelay);
        }
        if timing.watcher_delay_ms >= timing.suppression_window_ms {
            return Err(ConfigError::WatcherDelayExceedsWindow(
                timing.watcher_delay_ms,
                timing.suppression_window_ms,
            ));
        }

        if config.storage.key.is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}
