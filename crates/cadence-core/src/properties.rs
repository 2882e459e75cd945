//! Routine-wide key/value memory

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Free-form memory shared by every action in a routine
///
/// Values are stored as JSON so that they can be seeded from configuration
/// and read back as any deserializable type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
    values: HashMap<String, Value>,
}

impl Properties {
    /// Create an empty property store
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property only if it does not exist yet
    pub fn init(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    /// Get a property
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Get a property converted to a concrete type
    ///
    /// Returns None if the property is missing or has a different shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Check if a property exists
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Set a property, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Remove a property, returning its value
    pub fn delete(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Remove every property
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Number of stored properties
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over property names
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Copy every entry of `other` into this store, overwriting duplicates
    pub fn extend(&mut self, other: Properties) {
        self.values.extend(other.values);
    }
}

impl FromIterator<(String, Value)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
