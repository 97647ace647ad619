//! Registries the caller customizes before resolving: append-join keys and
//! named type coercions for `type:` annotations.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::map::fold_key;
use crate::value::FromConfigValue;

/// Key shipped in the default append registry.
pub const DEFAULT_APPEND_KEY: &str = "ScriptingDefineSymbols";
/// Separator of [`DEFAULT_APPEND_KEY`].
pub const DEFAULT_APPEND_SEPARATOR: &str = ";";

/// Keys whose values are joined across files instead of overridden.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendRegistry {
    separators: HashMap<String, String>,
}

impl Default for AppendRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.insert(DEFAULT_APPEND_KEY, DEFAULT_APPEND_SEPARATOR);
        registry
    }
}

impl AppendRegistry {
    /// A registry without the default key.
    pub fn empty() -> Self {
        Self {
            separators: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: &str, separator: &str) {
        self.separators.insert(fold_key(key), separator.to_string());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.separators.remove(&fold_key(key))
    }

    pub fn separator(&self, key: &str) -> Option<&str> {
        self.separators.get(&fold_key(key)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.separators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.separators.is_empty()
    }
}

/// Coerces an entry's value slots into a typed JSON value.
pub type Coercion = Box<dyn Fn(&[String]) -> Result<Value, String>>;

/// Named coercions that `type:<Name>` annotations may refer to.
///
/// Names match case-insensitively. The default registry knows the primitive
/// types under short names (`int`) and their CLR-style aliases
/// (`System.Int32`).
pub struct TypeRegistry {
    types: HashMap<String, (String, Coercion)>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.types.values().map(|(n, _)| n.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}

fn coerce_with<T, F>(to_json: F) -> Coercion
where
    T: FromConfigValue + 'static,
    F: Fn(T) -> Value + 'static,
{
    Box::new(move |values: &[String]| T::from_config(values).map(&to_json))
}

impl Default for TypeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for name in ["bool", "System.Boolean"] {
            registry.register(name, coerce_with(Value::Bool));
        }
        for name in ["int", "System.Int32"] {
            registry.register(name, coerce_with(|v: i32| Value::from(v)));
        }
        for name in ["long", "System.Int64"] {
            registry.register(name, coerce_with(|v: i64| Value::from(v)));
        }
        for name in ["float", "System.Single"] {
            registry.register(name, coerce_with(|v: f32| Value::from(f64::from(v))));
        }
        for name in ["double", "System.Double"] {
            registry.register(name, coerce_with(|v: f64| Value::from(v)));
        }
        for name in ["string", "System.String"] {
            registry.register(name, coerce_with(Value::String));
        }
        for name in ["string[]", "System.String[]"] {
            registry.register(name, coerce_with(|v: Vec<String>| Value::from(v)));
        }
        registry
    }
}

impl TypeRegistry {
    /// A registry with no types at all.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Register (or replace) a named coercion.
    pub fn register(&mut self, name: &str, coercion: Coercion) {
        self.types
            .insert(fold_key(name), (name.to_string(), coercion));
    }

    /// Canonical registered name for `name`, if known.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.types.get(&fold_key(name)).map(|(n, _)| n.as_str())
    }

    /// Run the coercion registered under `name`.
    pub fn coerce(&self, name: &str, values: &[String]) -> Option<Result<Value, String>> {
        self.types
            .get(&fold_key(name))
            .map(|(_, coercion)| coercion(values))
    }
}
