use std::path::Path;
use std::sync::LazyLock;

use regex_lite::Regex;
use roxmltree::{Document, Node};
use tracing::trace;

use crate::error::OneBuildError;
use crate::map::ConfigMap;
use crate::registry::{AppendRegistry, TypeRegistry};

static TYPE_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)type:([^ $]+)").expect("type annotation pattern"));

/// Merge one XML document on top of `map`.
///
/// Every element directly under the root is an entry keyed by its local
/// name. A leaf element contributes its text; a container contributes the
/// text of each child element, in order.
pub fn merge_document(
    map: &mut ConfigMap,
    path: &Path,
    content: &str,
    appends: &AppendRegistry,
    types: &TypeRegistry,
) -> Result<(), OneBuildError> {
    let doc = Document::parse(content).map_err(|e| OneBuildError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    for node in doc.root_element().children().filter(Node::is_element) {
        let key = node.tag_name().name();
        let type_name = match node.tag_name().namespace() {
            Some(ns) => annotated_type(ns, types)?,
            None => None,
        };

        let children: Vec<Node> = node.children().filter(Node::is_element).collect();
        let values = if children.is_empty() {
            vec![inner_text(&node)]
        } else {
            children.iter().map(inner_text).collect()
        };

        trace!(file = %path.display(), %key, ?values, "merging entry");
        merge_entry(map, key, values, appends);

        // an override replaces the annotation too; an append only adds one
        let appended = appends.separator(key).is_some();
        if let Some(entry) = map.entry_mut(key)
            && (!appended || type_name.is_some())
        {
            entry.type_name = type_name;
        }
    }
    Ok(())
}

/// Merge one entry: append-join for registered keys, replace otherwise.
///
/// For an append key with separator `S`, an absent or blank prior first value
/// is replaced outright. Otherwise the new first value is concatenated onto
/// the prior one, with `S` in between unless the prior value already ends
/// with it. Only the first slot changes.
pub fn merge_entry(map: &mut ConfigMap, key: &str, values: Vec<String>, appends: &AppendRegistry) {
    let Some(separator) = appends.separator(key) else {
        map.insert(key, values);
        return;
    };

    let prior = map
        .entry_mut(key)
        .and_then(|entry| entry.values.first_mut())
        .map(|first| {
            first.truncate(first.trim_end().len());
            first
        })
        .filter(|first| !first.is_empty());

    match prior {
        Some(first) => {
            if let Some(addition) = values.first() {
                if !first.ends_with(separator) {
                    first.push_str(separator);
                }
                first.push_str(addition);
            }
        }
        None => map.insert(key, values),
    }
}

/// Resolve a `type:<Name>` namespace against the registry.
fn annotated_type(namespace: &str, types: &TypeRegistry) -> Result<Option<String>, OneBuildError> {
    let Some(caps) = TYPE_ANNOTATION.captures(namespace) else {
        return Ok(None);
    };
    let name = &caps[1];
    types
        .resolve(name)
        .map(|canonical| Some(canonical.to_string()))
        .ok_or_else(|| OneBuildError::UnknownType(name.to_string()))
}

/// Concatenated text of all descendant text nodes.
fn inner_text(node: &Node) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vals(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn merge_all(docs: &[&str], appends: &AppendRegistry) -> ConfigMap {
        let types = TypeRegistry::default();
        let mut map = ConfigMap::new();
        for (i, doc) in docs.iter().enumerate() {
            let path = format!("file{i}.xml");
            merge_document(&mut map, Path::new(&path), doc, appends, &types).unwrap();
        }
        map
    }

    #[test]
    fn leaf_elements_become_single_values() {
        let map = merge_all(
            &["<config><Version>1.2</Version><Output.Dir>build</Output.Dir></config>"],
            &AppendRegistry::default(),
        );
        assert_eq!(map.values("Version").unwrap(), vals(&["1.2"]));
        assert_eq!(map.get("Output.Dir").unwrap(), "build");
    }

    #[test]
    fn container_elements_become_arrays() {
        let map = merge_all(
            &["<config><Build.Scenes><s>a.unity</s><s>b.unity</s></Build.Scenes></config>"],
            &AppendRegistry::default(),
        );
        assert_eq!(
            map.values("Build.Scenes").unwrap(),
            vals(&["a.unity", "b.unity"])
        );
    }

    #[test]
    fn inner_text_concatenates_descendants() {
        let map = merge_all(
            &["<config><Items><i>x<b>y</b>z</i></Items><Empty/></config>"],
            &AppendRegistry::default(),
        );
        assert_eq!(map.values("Items").unwrap(), vals(&["xyz"]));
        assert_eq!(map.values("Empty").unwrap(), vals(&[""]));
    }

    #[test]
    fn later_file_overrides_non_append_key() {
        let map = merge_all(
            &[
                "<config><Output.Dir>build</Output.Dir><Keep>1</Keep></config>",
                "<config><output.dir>build/debug</output.dir></config>",
            ],
            &AppendRegistry::default(),
        );
        assert_eq!(map.get("Output.Dir").unwrap(), "build/debug");
        assert_eq!(map.get("Keep").unwrap(), "1");
    }

    #[test]
    fn override_without_annotation_drops_type() {
        let map = merge_all(
            &[
                r#"<c><Code xmlns="type:int">3</Code><Count xmlns="type:int">1</Count></c>"#,
                "<c><Code>dev-build</Code></c>",
            ],
            &AppendRegistry::default(),
        );
        assert_eq!(map.get("Code").unwrap(), "dev-build");
        assert_eq!(map.type_name("Code"), None);
        assert_eq!(map.type_name("Count"), Some("int"));
        assert_eq!(map.coerce("Code", &TypeRegistry::default()).unwrap(), None);
    }

    #[test]
    fn append_keeps_earlier_annotation() {
        let appends = AppendRegistry::default();
        let map = merge_all(
            &[
                r#"<c><ScriptingDefineSymbols xmlns="type:string">A</ScriptingDefineSymbols></c>"#,
                "<c><ScriptingDefineSymbols>B</ScriptingDefineSymbols></c>",
            ],
            &appends,
        );
        assert_eq!(map.get("ScriptingDefineSymbols").unwrap(), "A;B");
        assert_eq!(map.type_name("ScriptingDefineSymbols"), Some("string"));
    }

    #[test]
    fn append_key_joins_left_to_right() {
        let map = merge_all(
            &[
                "<c><ScriptingDefineSymbols>a</ScriptingDefineSymbols></c>",
                "<c><ScriptingDefineSymbols>b</ScriptingDefineSymbols></c>",
                "<c><ScriptingDefineSymbols>c</ScriptingDefineSymbols></c>",
            ],
            &AppendRegistry::default(),
        );
        assert_eq!(map.get("ScriptingDefineSymbols").unwrap(), "a;b;c");
    }

    #[test]
    fn append_skips_separator_when_prior_ends_with_it() {
        let map = merge_all(
            &[
                "<c><ScriptingDefineSymbols>a; </ScriptingDefineSymbols></c>",
                "<c><ScriptingDefineSymbols>b</ScriptingDefineSymbols></c>",
            ],
            &AppendRegistry::default(),
        );
        assert_eq!(map.get("ScriptingDefineSymbols").unwrap(), "a;b");
    }

    #[test]
    fn append_replaces_blank_prior() {
        let map = merge_all(
            &[
                "<c><ScriptingDefineSymbols>  </ScriptingDefineSymbols></c>",
                "<c><ScriptingDefineSymbols>b</ScriptingDefineSymbols></c>",
            ],
            &AppendRegistry::default(),
        );
        assert_eq!(map.get("ScriptingDefineSymbols").unwrap(), "b");
    }

    #[test]
    fn append_touches_only_first_slot() {
        let mut appends = AppendRegistry::empty();
        appends.insert("Flags", "|");
        let mut map = ConfigMap::new();
        merge_entry(&mut map, "Flags", vals(&["a", "keep"]), &appends);
        merge_entry(&mut map, "Flags", vals(&["b", "ignored", "also"]), &appends);
        assert_eq!(map.values("Flags").unwrap(), vals(&["a|b", "keep"]));
    }

    #[test]
    fn custom_append_key_is_case_insensitive() {
        let mut appends = AppendRegistry::empty();
        appends.insert("defines", ",");
        let map = merge_all(
            &["<c><Defines>A</Defines></c>", "<c><DEFINES>B</DEFINES></c>"],
            &appends,
        );
        assert_eq!(map.get("defines").unwrap(), "A,B");
    }

    #[test]
    fn type_annotation_recorded() {
        let map = merge_all(
            &[r#"<config><Count xmlns="type:int">3</Count><Plain>x</Plain></config>"#],
            &AppendRegistry::default(),
        );
        assert_eq!(map.type_name("Count"), Some("int"));
        assert_eq!(map.type_name("Plain"), None);
    }

    #[test]
    fn prefixed_type_annotation_recorded() {
        let map = merge_all(
            &[r#"<config xmlns:t="TYPE:System.Boolean"><t:ShowFolder>true</t:ShowFolder></config>"#],
            &AppendRegistry::default(),
        );
        assert_eq!(map.get("ShowFolder").unwrap(), "true");
        assert_eq!(map.type_name("showfolder"), Some("System.Boolean"));
    }

    #[test]
    fn unrelated_namespace_is_ignored() {
        let map = merge_all(
            &[r#"<config><Foo xmlns="urn:example">1</Foo></config>"#],
            &AppendRegistry::default(),
        );
        assert_eq!(map.type_name("Foo"), None);
    }

    #[test]
    fn unknown_type_annotation_fails() {
        let mut map = ConfigMap::new();
        let result = merge_document(
            &mut map,
            Path::new("a.xml"),
            r#"<config><Pos xmlns="type:Vector3">1,2,3</Pos></config>"#,
            &AppendRegistry::default(),
            &TypeRegistry::default(),
        );
        assert!(matches!(result, Err(OneBuildError::UnknownType(t)) if t == "Vector3"));
    }

    #[test]
    fn malformed_xml_reports_path() {
        let mut map = ConfigMap::new();
        let result = merge_document(
            &mut map,
            Path::new("broken.xml"),
            "<config><open></config>",
            &AppendRegistry::default(),
            &TypeRegistry::default(),
        );
        match result {
            Err(e @ OneBuildError::ParseError { .. }) => {
                assert!(e.to_string().contains("broken.xml"))
            }
            other => panic!("Expected ParseError, got {other:?}"),
        }
    }
}
