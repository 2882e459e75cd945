//! YAML configuration loading for Cadence
//!
//! This crate loads the settings an embedder needs to run a routine:
//! routine options, initial properties, tick loop pacing, and the log
//! filter. YAML files may use two custom tags:
//!
//! - `!include path` - Include another YAML file
//! - `!env_var NAME [default]` - Environment variable substitution
//!
//! # Example
//!
//! ```ignore
//! use cadence_config::load_config;
//!
//! let config = load_config("cadence.yaml")?;
//! let routine = Routine::with_options(SystemClock::new(), config.routine);
//! ```

mod error;
mod loader;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_yaml, YamlLoader};
pub use settings::{load_config, load_config_str, CadenceConfig, LoggingConfig, RunnerConfig};

// Re-export serde_yaml::Value for convenience
pub use serde_yaml::Value;
