//! Operations behind the CLI commands and the result type callers display.

use std::fmt;
use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::error::OneBuildError;
use crate::file::CandidateFile;
use crate::map::ConfigMap;
use crate::orchestrate::plan::BuildPlan;
use crate::registry::TypeRegistry;
use crate::types::OutputFormat;

/// Result of an operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// Selected config files in merge order, with the version they matched.
    Files {
        version: String,
        files: Vec<CandidateFile>,
    },
    /// All resolved entries as `(key, joined value)` pairs.
    Listing { entries: Vec<(String, String)> },
    /// The resolved config rendered as JSON or TOML.
    Rendered(String),
    /// One resolved entry.
    KeyValue {
        key: String,
        value: String,
        type_name: Option<String>,
    },
    /// The derived build plan.
    Plan(Box<BuildPlan>),
    /// Settings template, for stdout.
    Template(String),
    /// Settings template written to a file.
    TemplateWritten { path: PathBuf },
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionResult::Files { version, files } => {
                write!(f, "# version: {version}")?;
                for file in files {
                    write!(f, "\n{:>3}  {}", file.score, file.path.display())?;
                }
                Ok(())
            }
            ActionResult::Listing { entries } => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                Ok(())
            }
            ActionResult::Rendered(text) => write!(f, "{text}"),
            ActionResult::KeyValue {
                key,
                value,
                type_name,
            } => {
                if let Some(t) = type_name {
                    writeln!(f, "# type: {t}")?;
                }
                write!(f, "{key} = {value}")
            }
            ActionResult::Plan(plan) => write!(f, "{plan}"),
            ActionResult::Template(t) => write!(f, "{t}"),
            ActionResult::TemplateWritten { path } => {
                write!(f, "Settings template written to {}", path.display())
            }
        }
    }
}

/// List every entry as `key = value`, values joined with `,`.
pub fn list_values(config: &ConfigMap) -> ActionResult {
    ActionResult::Listing {
        entries: config
            .iter()
            .map(|e| (e.key.clone(), e.joined()))
            .collect(),
    }
}

/// Look up one entry.
pub fn get_value(config: &ConfigMap, key: &str) -> Result<ActionResult, OneBuildError> {
    let entry = config
        .entry(key)
        .ok_or_else(|| OneBuildError::KeyNotFound(key.into()))?;
    Ok(ActionResult::KeyValue {
        key: entry.key.clone(),
        value: entry.joined(),
        type_name: entry.type_name.clone(),
    })
}

/// JSON view of the config: annotated entries are coerced through `types`,
/// the rest are strings (one slot) or string arrays.
pub fn typed_json(config: &ConfigMap, types: &TypeRegistry) -> Result<Value, OneBuildError> {
    let mut object = Map::new();
    for entry in config.iter() {
        let value = match config.coerce(&entry.key, types)? {
            Some(typed) => typed,
            None => match entry.values.as_slice() {
                [single] => Value::String(single.clone()),
                many => Value::from(many.to_vec()),
            },
        };
        object.insert(entry.key.clone(), value);
    }
    Ok(Value::Object(object))
}

/// Render the whole config in `format`.
pub fn render(
    config: &ConfigMap,
    types: &TypeRegistry,
    format: OutputFormat,
) -> Result<ActionResult, OneBuildError> {
    let render_err = |reason: String| OneBuildError::Render {
        format: format!("{format:?}").to_lowercase(),
        reason,
    };
    match format {
        OutputFormat::Plain => Ok(list_values(config)),
        OutputFormat::Json => {
            let value = typed_json(config, types)?;
            serde_json::to_string_pretty(&value)
                .map(ActionResult::Rendered)
                .map_err(|e| render_err(e.to_string()))
        }
        OutputFormat::Toml => {
            let value = typed_json(config, types)?;
            toml::to_string(&value)
                .map(ActionResult::Rendered)
                .map_err(|e| render_err(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample() -> ConfigMap {
        let mut map = ConfigMap::new();
        map.insert("Output.Dir", vec!["build".into()]);
        map.insert("Build.Scenes", vec!["A.unity".into(), "B.unity".into()]);
        map.insert("Count", vec!["3".into()]);
        map.entry_mut("Count").unwrap().type_name = Some("int".into());
        map
    }

    #[test]
    fn listing_joins_values() {
        let result = list_values(&sample());
        assert_eq!(
            result.to_string(),
            "Output.Dir = build\nBuild.Scenes = A.unity,B.unity\nCount = 3"
        );
    }

    #[test]
    fn get_shows_type() {
        let result = get_value(&sample(), "count").unwrap();
        assert_eq!(result.to_string(), "# type: int\nCount = 3");
        let plain = get_value(&sample(), "output.dir").unwrap();
        assert_eq!(plain.to_string(), "Output.Dir = build");
    }

    #[test]
    fn get_missing_key() {
        let result = get_value(&sample(), "Nope");
        assert!(matches!(result, Err(OneBuildError::KeyNotFound(_))));
    }

    #[test]
    fn json_is_typed_and_ordered() {
        let result = render(&sample(), &TypeRegistry::default(), OutputFormat::Json).unwrap();
        let ActionResult::Rendered(text) = result else {
            panic!("Expected rendered output");
        };
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["Count"], Value::from(3));
        assert_eq!(value["Build.Scenes"], serde_json::json!(["A.unity", "B.unity"]));
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["Output.Dir", "Build.Scenes", "Count"]);
    }

    #[test]
    fn toml_quotes_dotted_keys() {
        let result = render(&sample(), &TypeRegistry::default(), OutputFormat::Toml).unwrap();
        let text = result.to_string();
        assert!(text.contains("\"Output.Dir\" = \"build\""));
        assert!(text.contains("Count = 3"));
        let parsed: toml::Table = toml::from_str(&text).unwrap();
        assert_eq!(parsed["Build.Scenes"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn bad_typed_value_fails_render() {
        let mut map = sample();
        map.insert("Count", vec!["three".into()]);
        let result = render(&map, &TypeRegistry::default(), OutputFormat::Json);
        assert!(matches!(result, Err(OneBuildError::Conversion { .. })));
    }

    #[test]
    fn files_display() {
        let result = ActionResult::Files {
            version: "debug".into(),
            files: vec![
                CandidateFile {
                    path: PathBuf::from("cfg/base.xml"),
                    tags: vec!["base".into()],
                    score: 0,
                },
                CandidateFile {
                    path: PathBuf::from("cfg/debug.xml"),
                    tags: vec!["debug".into()],
                    score: 10,
                },
            ],
        };
        assert_eq!(
            result.to_string(),
            "# version: debug\n  0  cfg/base.xml\n 10  cfg/debug.xml"
        );
    }
}
