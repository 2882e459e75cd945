//! Typed Cadence configuration
//!
//! ```yaml
//! routine:
//!   on_end: loop
//!   gate_commit: same_tick
//!   advance: chain
//! properties:
//!   lives: 3
//! runner:
//!   tick_interval_ms: 16
//!   max_ticks: 600
//! logging:
//!   filter: cadence_script=debug
//! ```

use cadence_core::{Properties, RoutineOptions};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::Path;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};
use crate::loader::{load_yaml, YamlLoader};

/// Tick loop pacing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Delay between ticks in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Stop after this many ticks even if blocks are still active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ticks: Option<u64>,
}

impl RunnerConfig {
    /// Delay between ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: None,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive string
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    16
}

fn default_filter() -> String {
    "info".to_string()
}

/// Complete configuration for running a routine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CadenceConfig {
    /// Scheduler options
    #[serde(default)]
    pub routine: RoutineOptions,

    /// Properties seeded into the routine before the first tick
    #[serde(default)]
    pub properties: Properties,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CadenceConfig {
    /// Parse configuration from an already loaded YAML value
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml(yaml: Value) -> ConfigResult<Self> {
        let yaml = match yaml {
            Value::Null => Value::Mapping(serde_yaml::Mapping::new()),
            Value::Mapping(_) => yaml,
            _ => {
                return Err(ConfigError::InvalidSetting {
                    key: "root".to_string(),
                    reason: "configuration must be a mapping".to_string(),
                })
            }
        };

        let config: CadenceConfig =
            serde_yaml::from_value(yaml).map_err(|e| ConfigError::InvalidSetting {
                key: "root".to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.runner.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidSetting {
                key: "runner.tick_interval_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                key: "logging.filter".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Load configuration from a YAML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<CadenceConfig> {
    CadenceConfig::from_yaml(load_yaml(path)?)
}

/// Load configuration from a YAML string
///
/// Relative includes resolve against the current directory.
pub fn load_config_str(content: &str) -> ConfigResult<CadenceConfig> {
    let mut loader = YamlLoader::new(".");
    CadenceConfig::from_yaml(loader.load_string(content, Path::new("<string>"))?)
}
