//! Errors raised while reading a cadence configuration
//!
//! Loader errors name the document they came from; setting errors name the
//! dotted key that failed validation.

use std::path::PathBuf;
use thiserror::Error;

/// Result of loading or validating a configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Why a configuration could not be turned into runner settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file or an included file could not be read
    #[error("cannot read configuration {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document is not valid YAML
    #[error("malformed YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `!include` was given something other than a file path
    #[error("!include expects a file path, got {path}: {reason}")]
    InvalidIncludePath { path: String, reason: String },

    /// `!include` names a file that does not exist
    #[error("!include target {path} does not exist")]
    IncludeNotFound { path: PathBuf },

    /// A file includes itself, directly or through other files
    #[error("{path} includes itself")]
    CircularInclude { path: PathBuf },

    /// `!env_var` names an unset variable and carries no default
    #[error("!env_var {var} is unset; set it or write `!env_var {var} <default>`")]
    EnvVarNotFound { var: String },

    /// A setting is out of range or has the wrong type
    #[error("setting '{key}' rejected: {reason}")]
    InvalidSetting { key: String, reason: String },
}
