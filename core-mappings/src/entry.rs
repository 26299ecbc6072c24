//! Typed mapping entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Shape of a [`MappingEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingKind {
    Scalar,
    List,
    Map,
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MappingKind::Scalar => "scalar",
            MappingKind::List => "list",
            MappingKind::Map => "map",
        })
    }
}

/// A resolved symbol mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingEntry {
    /// A single name, e.g. a class or member name
    Scalar(String),
    List(Vec<Value>),
    /// Named sub-entries, e.g. the members of one mapped class
    Map(BTreeMap<String, Value>),
}

impl MappingEntry {
    pub fn kind(&self) -> MappingKind {
        match self {
            MappingEntry::Scalar(_) => MappingKind::Scalar,
            MappingEntry::List(_) => MappingKind::List,
            MappingEntry::Map(_) => MappingKind::Map,
        }
    }

    /// Converts a document value. Numbers and booleans become scalars in
    /// their textual form; `null` has no entry representation.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(MappingEntry::Scalar(s)),
            Value::Number(n) => Some(MappingEntry::Scalar(n.to_string())),
            Value::Bool(b) => Some(MappingEntry::Scalar(b.to_string())),
            Value::Array(items) => Some(MappingEntry::List(items)),
            Value::Object(map) => Some(MappingEntry::Map(map.into_iter().collect())),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            MappingEntry::Scalar(s) => Value::String(s.clone()),
            MappingEntry::List(items) => Value::Array(items.clone()),
            MappingEntry::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MappingEntry::Scalar(s) => Some(s),
            _ => None,
        }
    }
}
