//! Ordered edit-operation mapping
//!
//! Edits are kept in insertion order (serde_json is built with
//! `preserve_order`), which makes "first quality key" lookups deterministic.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::request::format::OutputFormat;

/// Operation name → parameter value(s), in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Edits(Map<String, Value>);

impl Edits {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Insert or replace an operation; a replaced key keeps its position
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.shift_remove(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Mutable access to an object-valued operation, created empty if absent
    ///
    /// A non-object value under the same name is replaced.
    pub fn object_mut(&mut self, name: &str) -> &mut Map<String, Value> {
        let entry = self
            .0
            .entry(name.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        match entry {
            Value::Object(map) => map,
            _ => unreachable!("entry was just set to an object"),
        }
    }

    /// Merge another edit set in; object values are merged key by key
    pub fn merge(&mut self, other: Edits) {
        for (name, value) in other.0 {
            match (self.0.get_mut(&name), value) {
                (Some(Value::Object(existing)), Value::Object(incoming)) => {
                    for (k, v) in incoming {
                        existing.insert(k, v);
                    }
                }
                (_, value) => {
                    self.0.insert(name, value);
                }
            }
        }
    }

    /// The explicit `toFormat` operation, if any
    pub fn to_format(&self) -> Option<&str> {
        self.0.get("toFormat").and_then(Value::as_str)
    }

    /// First key naming a quality-bearing output format
    pub fn first_quality_key(&self) -> Option<OutputFormat> {
        self.0.keys().find_map(|key| OutputFormat::from_edit_key(key))
    }

    /// Move the first quality-bearing key to `target`
    ///
    /// At most one key is renamed per call, and only when it differs from
    /// the target. Returns whether a rename happened.
    pub fn rename_quality_key(&mut self, target: OutputFormat) -> bool {
        let Some(current) = self.first_quality_key() else {
            return false;
        };
        if current == target {
            return false;
        }
        match self.0.shift_remove(current.as_str()) {
            Some(value) => {
                self.0.insert(target.as_str().to_string(), value);
                true
            }
            None => false,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}
