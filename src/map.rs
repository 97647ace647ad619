//! The merged configuration mapping and its typed accessor.
//!
//! [`ConfigMap`] keeps entries in insertion order and looks keys up
//! case-insensitively. The casing of a key's first insertion is kept for
//! display. Values are ordered string slots: one slot for a leaf element,
//! one per child for a container element.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::warn;

use crate::error::OneBuildError;
use crate::registry::TypeRegistry;
use crate::value::FromConfigValue;

/// One merged config entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub key: String,
    pub values: Vec<String>,
    /// Registered type name from a `type:` annotation, if any.
    pub type_name: Option<String>,
}

impl ConfigEntry {
    /// First value slot, or `""` for an entry without values.
    pub fn first(&self) -> &str {
        self.values.first().map(String::as_str).unwrap_or_default()
    }

    /// All slots joined with `,`.
    pub fn joined(&self) -> String {
        self.values.join(",")
    }
}

/// Insertion-ordered, case-insensitive key → values mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigMap {
    entries: Vec<ConfigEntry>,
    index: HashMap<String, usize>,
}

pub(crate) fn fold_key(key: &str) -> String {
    key.to_lowercase()
}

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigEntry> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn entry(&self, key: &str) -> Option<&ConfigEntry> {
        self.index.get(&fold_key(key)).map(|&i| &self.entries[i])
    }

    pub(crate) fn entry_mut(&mut self, key: &str) -> Option<&mut ConfigEntry> {
        let i = *self.index.get(&fold_key(key))?;
        Some(&mut self.entries[i])
    }

    pub(crate) fn entry_at_mut(&mut self, i: usize) -> &mut ConfigEntry {
        &mut self.entries[i]
    }

    pub(crate) fn entry_at(&self, i: usize) -> &ConfigEntry {
        &self.entries[i]
    }

    /// Insert or replace the values of `key`.
    ///
    /// A replaced entry keeps its position, original key casing and type name.
    pub fn insert(&mut self, key: &str, values: Vec<String>) {
        match self.entry_mut(key) {
            Some(entry) => entry.values = values,
            None => {
                self.index.insert(fold_key(key), self.entries.len());
                self.entries.push(ConfigEntry {
                    key: key.to_string(),
                    values,
                    type_name: None,
                });
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(&fold_key(key))
    }

    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.entry(key).map(|e| e.values.as_slice())
    }

    pub fn type_name(&self, key: &str) -> Option<&str> {
        self.entry(key).and_then(|e| e.type_name.as_deref())
    }

    /// The entry's values joined with `,`. Fails if the key is absent.
    pub fn get(&self, key: &str) -> Result<String, OneBuildError> {
        self.entry(key)
            .map(ConfigEntry::joined)
            .ok_or_else(|| OneBuildError::KeyNotFound(key.into()))
    }

    /// Like [`get`](Self::get) but falls back to `default` instead of failing.
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.entry(key)
            .map(ConfigEntry::joined)
            .unwrap_or_else(|| default.to_string())
    }

    /// Convert the entry to `T`, returning `default` when the key is absent
    /// or the conversion fails. Failures are logged, never returned.
    pub fn get_as<T: FromConfigValue>(&self, key: &str, default: T) -> T {
        let Some(entry) = self.entry(key) else {
            return default;
        };
        match T::from_config(&entry.values) {
            Ok(value) => value,
            Err(reason) => {
                warn!(key = %entry.key, %reason, "config error, using default");
                default
            }
        }
    }

    /// Convert the entry to `T`, failing on a missing key or a bad value.
    pub fn require_as<T: FromConfigValue>(&self, key: &str) -> Result<T, OneBuildError> {
        let entry = self
            .entry(key)
            .ok_or_else(|| OneBuildError::KeyNotFound(key.into()))?;
        T::from_config(&entry.values).map_err(|reason| OneBuildError::Conversion {
            key: entry.key.clone(),
            reason,
        })
    }

    /// Run the registered coercion of an annotated entry.
    ///
    /// `Ok(None)` when the key is absent or carries no `type:` annotation.
    pub fn coerce(
        &self,
        key: &str,
        types: &TypeRegistry,
    ) -> Result<Option<serde_json::Value>, OneBuildError> {
        let Some(entry) = self.entry(key) else {
            return Ok(None);
        };
        let Some(type_name) = entry.type_name.as_deref() else {
            return Ok(None);
        };
        match types.coerce(type_name, &entry.values) {
            Some(Ok(value)) => Ok(Some(value)),
            Some(Err(reason)) => Err(OneBuildError::Conversion {
                key: entry.key.clone(),
                reason,
            }),
            None => Err(OneBuildError::UnknownType(type_name.to_string())),
        }
    }

    /// Pretty JSON rendering for logs, in insertion order.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<unrenderable: {e}>"))
    }
}

/// Serializes as a map: single-slot entries as strings, others as arrays.
impl Serialize for ConfigMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            match entry.values.as_slice() {
                [single] => map.serialize_entry(&entry.key, single)?,
                many => map.serialize_entry(&entry.key, many)?,
            }
        }
        map.end()
    }
}
