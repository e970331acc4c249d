use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure for togglekeeper
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// How the two controls are identified on the page
    #[serde(default)]
    pub control: ControlConfig,

    /// Timing contract between the click binder, watcher and startup
    #[serde(default)]
    pub timing: TimingConfig,

    /// Persistent store configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Selector configuration for the enable/disable controls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ControlConfig {
    /// Element name both controls are rendered as
    #[serde(default = "default_element")]
    pub element: String,

    /// Attribute carrying the accessible label
    #[serde(default = "default_label_attribute")]
    pub label_attribute: String,

    /// Label of the control offered while the feature is off
    #[serde(default = "default_enable_label")]
    pub enable_label: String,

    /// Label of the control offered while the feature is on
    #[serde(default = "default_disable_label")]
    pub disable_label: String,
}

fn default_element() -> String {
    "button".to_string()
}

fn default_label_attribute() -> String {
    "aria-label".to_string()
}

fn default_enable_label() -> String {
    "Enable search".to_string()
}

fn default_disable_label() -> String {
    "Disable search".to_string()
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            element: default_element(),
            label_attribute: default_label_attribute(),
            enable_label: default_enable_label(),
            disable_label: default_disable_label(),
        }
    }
}

/// Timing contract.
///
/// A user click must be observed before the watcher reacts to the mutation
/// that click caused; `watcher_delay_ms` must stay well below
/// `suppression_window_ms` for that to hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TimingConfig {
    /// How long reconciliation stays suppressed after a user click
    #[serde(default = "default_suppression_window_ms")]
    pub suppression_window_ms: u64,

    /// Delay between a relevant mutation batch and the drift check
    #[serde(default = "default_watcher_delay_ms")]
    pub watcher_delay_ms: u64,

    /// Delay after loading the stored state before the first apply
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

const fn default_suppression_window_ms() -> u64 {
    150
}

const fn default_watcher_delay_ms() -> u64 {
    50
}

const fn default_settle_delay_ms() -> u64 {
    500
}

impl TimingConfig {
    pub const fn suppression_window(&self) -> Duration {
        Duration::from_millis(self.suppression_window_ms)
    }

    pub const fn watcher_delay(&self) -> Duration {
        Duration::from_millis(self.watcher_delay_ms)
    }

    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            suppression_window_ms: default_suppression_window_ms(),
            watcher_delay_ms: default_watcher_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

/// Persistent store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StorageConfig {
    /// Key the desired state is stored under
    #[serde(default = "default_storage_key")]
    pub key: String,

    /// Path of the JSON state file
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_storage_key() -> String {
    "t3SearchManualState".to_string()
}

fn default_storage_path() -> String {
    ".togglekeeper/state.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key: default_storage_key(),
            path: default_storage_path(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stdout only when unset)
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation for file output: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
