//! Typed section tree for parsed and merged stack manifests.
//!
//! Manifests are arbitrary-depth YAML. Instead of passing untyped maps around and
//! asserting types at every descent, every node is a [`ConfigValue`], so each
//! lookup is an exhaustive match that produces a typed error when the shape is
//! wrong.
//!
//! Mappings are [`BTreeMap`]s keyed by string. Sorted keys make serialization of a
//! resolved component byte-identical across runs, which downstream build caches
//! rely on.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::collections::BTreeMap;

use crate::core::StackError;

/// A mapping of section keys to values.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// One node of a stack section tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConfigValue {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Sequence(Vec<ConfigValue>),
    Mapping(ConfigMap),
}

impl ConfigValue {
    /// Short name of the variant, used in shape errors.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn as_mapping(&self) -> Option<&ConfigMap> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut ConfigMap> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[ConfigValue]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Render a scalar as plain text. Mappings, sequences and null yield `None`.
    pub fn scalar_to_string(&self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::Null | Self::Sequence(_) | Self::Mapping(_) => None,
        }
    }

    /// Collect a sequence of strings, skipping non-string items.
    pub fn string_list(&self) -> Vec<String> {
        self.as_sequence()
            .map(|items| items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default()
    }

    /// Look up a key when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Follow a path of keys through nested mappings.
    pub fn get_path(&self, path: &[&str]) -> Option<&ConfigValue> {
        path.iter().try_fold(self, |value, key| value.get(key))
    }

    /// Convert any serializable value into a section tree.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, StackError> {
        serde_yaml::to_value(value)
            .map(Self::from)
            .map_err(|e| StackError::config(format!("failed to convert value: {e}")))
    }

    /// Serialize as YAML text.
    pub fn to_yaml_string(&self) -> Result<String, StackError> {
        serde_yaml::to_string(self)
            .map_err(|e| StackError::config(format!("failed to serialize YAML: {e}")))
    }

    /// Serialize as JSON text.
    pub fn to_json_string(&self, pretty: bool) -> Result<String, StackError> {
        let result = if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        };
        result.map_err(|e| StackError::config(format!("failed to serialize JSON: {e}")))
    }
}

/// Lookup helpers on mappings, returning defaults for absent keys.
pub trait ConfigMapExt {
    /// The mapping under `key`, or an empty mapping when absent or not a mapping.
    fn mapping_or_empty(&self, key: &str) -> ConfigMap;
    /// The string under `key`, or an empty string.
    fn string_or_empty(&self, key: &str) -> String;
}

impl ConfigMapExt for ConfigMap {
    fn mapping_or_empty(&self, key: &str) -> ConfigMap {
        self.get(key).and_then(ConfigValue::as_mapping).cloned().unwrap_or_default()
    }

    fn string_or_empty(&self, key: &str) -> String {
        self.get(key).and_then(ConfigValue::as_str).unwrap_or_default().to_string()
    }
}

impl From<serde_yaml::Value> for ConfigValue {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => Self::Null,
            serde_yaml::Value::Bool(b) => Self::Bool(b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_yaml::Value::String(s) => Self::String(s),
            serde_yaml::Value::Sequence(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            serde_yaml::Value::Mapping(mapping) => Self::Mapping(
                mapping.into_iter().map(|(k, v)| (yaml_key_to_string(k), Self::from(v))).collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Self::from(tagged.value),
        }
    }
}

// Non-string YAML keys (`1: foo`, `true: bar`) are kept under their text form.
fn yaml_key_to_string(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        other => serde_yaml::to_string(&other).unwrap_or_default().trim_end().to_string(),
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(value: ConfigMap) -> Self {
        Self::Mapping(value)
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(value: Vec<String>) -> Self {
        Self::Sequence(value.into_iter().map(Self::String).collect())
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(value: Vec<ConfigValue>) -> Self {
        Self::Sequence(value)
    }
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Mapping(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

/// Parse YAML text into a section tree.
pub fn parse_yaml(content: &str) -> Result<ConfigValue, serde_yaml::Error> {
    serde_yaml::from_str::<serde_yaml::Value>(content).map(ConfigValue::from)
}
