//! YAML loader with custom tag support
//!
//! Supported tags:
//! - `!include path` - Include another YAML file, relative to the including file
//! - `!env_var NAME [default]` - Environment variable substitution
//!
//! Substituted environment text is read as a YAML scalar, so numbers and
//! booleans keep their type.

use crate::error::{ConfigError, ConfigResult};
use serde_yaml::value::TaggedValue;
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// YAML loader that resolves `!include` and `!env_var`
pub struct YamlLoader {
    /// Base directory for resolving relative paths
    base_dir: PathBuf,
    /// Files currently being loaded, outermost first
    include_stack: Vec<PathBuf>,
}

impl YamlLoader {
    /// Create a loader resolving relative paths against `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            include_stack: Vec::new(),
        }
    }

    /// Load and process a YAML file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> ConfigResult<Value> {
        let path = self.resolve_path(path.as_ref());
        debug!("Loading YAML file: {:?}", path);

        if self.include_stack.contains(&path) {
            return Err(ConfigError::CircularInclude { path });
        }

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;

        self.include_stack.push(path.clone());
        let result = self.load_string(&content, &path);
        self.include_stack.pop();

        result
    }

    /// Load and process YAML from a string
    ///
    /// `source_path` names the document in errors and anchors relative
    /// includes.
    pub fn load_string(&mut self, content: &str, source_path: &Path) -> ConfigResult<Value> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: source_path.to_path_buf(),
            source: e,
        })?;

        self.process_value(value, source_path)
    }

    fn process_value(&mut self, value: Value, source_path: &Path) -> ConfigResult<Value> {
        match value {
            Value::Tagged(tagged) => self.process_tagged(*tagged, source_path),
            Value::Mapping(map) => {
                let mut result = serde_yaml::Mapping::new();
                for (k, v) in map {
                    let v = self.process_value(v, source_path)?;
                    result.insert(k, v);
                }
                Ok(Value::Mapping(result))
            }
            Value::Sequence(seq) => seq
                .into_iter()
                .map(|v| self.process_value(v, source_path))
                .collect::<ConfigResult<Vec<_>>>()
                .map(Value::Sequence),
            _ => Ok(value),
        }
    }

    fn process_tagged(&mut self, tagged: TaggedValue, source_path: &Path) -> ConfigResult<Value> {
        let tag = tagged.tag.to_string();
        trace!("Processing tag '{}' with value {:?}", tag, tagged.value);

        match tag.as_str() {
            "!include" => self.process_include(&tagged.value, source_path),
            "!env_var" => process_env_var(&tagged.value),
            _ => {
                // Unknown tag: keep it, but resolve what is inside
                let value = self.process_value(tagged.value, source_path)?;
                Ok(Value::Tagged(Box::new(TaggedValue {
                    tag: tagged.tag,
                    value,
                })))
            }
        }
    }

    fn process_include(&mut self, value: &Value, source_path: &Path) -> ConfigResult<Value> {
        let Value::String(raw) = value else {
            return Err(ConfigError::InvalidIncludePath {
                path: format!("{:?}", value),
                reason: "path must be a string".to_string(),
            });
        };

        let base = source_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(&self.base_dir);
        let path = base.join(raw);
        if !path.is_file() {
            return Err(ConfigError::IncludeNotFound { path });
        }

        debug!("Including file: {:?}", path);
        self.load_file(path)
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// The directory relative paths are resolved against
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

fn process_env_var(value: &Value) -> ConfigResult<Value> {
    let Value::String(text) = value else {
        return Err(ConfigError::InvalidSetting {
            key: "!env_var".to_string(),
            reason: "expected 'NAME' or 'NAME default'".to_string(),
        });
    };

    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let var = parts.next().unwrap_or_default();
    let default = parts.next().map(str::trim);

    let text = match (std::env::var(var), default) {
        (Ok(text), _) => text,
        (Err(_), Some(default)) => {
            debug!("Env var {} not set, using default", var);
            default.to_string()
        }
        (Err(_), None) => {
            return Err(ConfigError::EnvVarNotFound {
                var: var.to_string(),
            })
        }
    };

    Ok(scalar(text))
}

/// Read text as a YAML scalar, falling back to a plain string
fn scalar(text: String) -> Value {
    match serde_yaml::from_str::<Value>(&text) {
        Ok(v @ (Value::Bool(_) | Value::Number(_))) => v,
        _ => Value::String(text),
    }
}

/// Load a YAML file with tag processing
///
/// Relative includes resolve against the file's own directory.
pub fn load_yaml(path: impl AsRef<Path>) -> ConfigResult<Value> {
    let path = path.as_ref();
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let file = path.file_name().map(PathBuf::from).unwrap_or_default();
    YamlLoader::new(base_dir).load_file(file)
}
