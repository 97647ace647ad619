//! Explicit capability table from config keys to toolchain settings.
//!
//! The collaborator registers one setter per key it understands. Applying a
//! config walks every entry that is not a [custom key](super::plan::CUSTOM_KEYS)
//! and hands its values to the matching setter. Keys without a setter, such
//! as helpers that only feed templates, are logged and skipped unless the
//! registry is [`strict`](SetterRegistry::strict).

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::OneBuildError;
use crate::map::{ConfigMap, fold_key};
use crate::value::FromConfigValue;

/// A setter receives the target and the entry's raw value slots.
pub type Setter<T> = Box<dyn Fn(&mut T, &[String]) -> Result<(), String>>;

pub struct SetterRegistry<T> {
    setters: HashMap<String, (String, Setter<T>)>,
    strict: bool,
}

impl<T> Default for SetterRegistry<T> {
    fn default() -> Self {
        Self {
            setters: HashMap::new(),
            strict: false,
        }
    }
}

impl<T> SetterRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raw setter. Keys match case-insensitively; a second
    /// registration for the same key replaces the first.
    pub fn register<F>(&mut self, key: &str, setter: F) -> &mut Self
    where
        F: Fn(&mut T, &[String]) -> Result<(), String> + 'static,
    {
        self.setters
            .insert(fold_key(key), (key.to_string(), Box::new(setter)));
        self
    }

    /// Register a setter that takes an already-converted value.
    pub fn register_typed<V, F>(&mut self, key: &str, setter: F) -> &mut Self
    where
        V: FromConfigValue,
        F: Fn(&mut T, V) + 'static,
    {
        self.register(key, move |target, values| {
            setter(target, V::from_config(values)?);
            Ok(())
        })
    }

    /// Fail on config keys without a setter instead of skipping them.
    pub fn strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.setters.contains_key(&fold_key(key))
    }

    pub fn len(&self) -> usize {
        self.setters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.setters.is_empty()
    }

    /// Apply every non-custom entry of `config` to `target`, in config order.
    ///
    /// Returns the number of settings applied. Stops at the first setter that
    /// rejects its value, or in strict mode at the first key without one.
    pub fn apply(&self, config: &ConfigMap, target: &mut T) -> Result<usize, OneBuildError> {
        let mut applied = 0;
        for entry in config.iter() {
            if super::plan::is_custom_key(&entry.key) {
                continue;
            }
            let Some((_, setter)) = self.setters.get(&fold_key(&entry.key)) else {
                if self.strict {
                    return Err(OneBuildError::UnknownSetting(entry.key.clone()));
                }
                warn!(key = %entry.key, "no setter for config key, skipping");
                continue;
            };
            setter(target, &entry.values).map_err(|reason| OneBuildError::Setter {
                key: entry.key.clone(),
                values: entry.joined(),
                reason,
            })?;
            debug!(key = %entry.key, values = ?entry.values, "applied setting");
            applied += 1;
        }
        Ok(applied)
    }
}
