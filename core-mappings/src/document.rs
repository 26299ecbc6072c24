//! Persisted mapping document.
//!
//! A flat JSON object. The reserved integer [`BUILD_NUMBER_KEY`] records the
//! host build the entries were scanned from; every other key is an entry.

use crate::entry::MappingEntry;
use crate::error::{CacheError, Result};
use bridge_traits::scanner::ScanDocument;
use serde_json::Value;
use std::collections::HashMap;

/// Reserved key holding the host build number.
pub const BUILD_NUMBER_KEY: &str = "snap_build_number";

/// A parsed, fully validated document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingDocument {
    pub build_number: i64,
    pub entries: HashMap<String, MappingEntry>,
}

impl MappingDocument {
    /// Parses a persisted document.
    ///
    /// Either every entry converts or the whole document is rejected.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| CacheError::CorruptCache(format!("invalid JSON: {}", e)))?;
        let Value::Object(object) = value else {
            return Err(CacheError::CorruptCache(
                "document is not an object".to_string(),
            ));
        };
        Self::from_object(object, CacheError::CorruptCache)
    }

    /// Validates scanner output and stamps it with `build_number`.
    pub fn from_scan(mut document: ScanDocument, build_number: i64) -> Result<Self> {
        document.insert(BUILD_NUMBER_KEY.to_string(), Value::from(build_number));
        Self::from_object(document, CacheError::ScanFailed)
    }

    fn from_object(
        mut object: serde_json::Map<String, Value>,
        invalid: fn(String) -> CacheError,
    ) -> Result<Self> {
        let build_number = match object.remove(BUILD_NUMBER_KEY) {
            Some(value) => value
                .as_i64()
                .ok_or_else(|| invalid(format!("{} is not an integer", BUILD_NUMBER_KEY)))?,
            None => return Err(invalid(format!("missing {}", BUILD_NUMBER_KEY))),
        };

        let mut entries = HashMap::with_capacity(object.len());
        for (key, value) in object {
            let entry = MappingEntry::from_value(value)
                .ok_or_else(|| invalid(format!("entry {} is null", key)))?;
            entries.insert(key, entry);
        }

        Ok(Self {
            build_number,
            entries,
        })
    }

    /// Serializes the document in its persisted form.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut object = serde_json::Map::with_capacity(self.entries.len() + 1);
        object.insert(
            BUILD_NUMBER_KEY.to_string(),
            Value::from(self.build_number),
        );
        for (key, entry) in &self.entries {
            object.insert(key.clone(), entry.to_value());
        }
        serde_json::to_vec(&Value::Object(object))
            .map_err(|e| CacheError::CorruptCache(format!("cannot serialize: {}", e)))
    }
}
