//! Template expansion over the merged mapping.
//!
//! Values may embed `{$Name}` or `{$Name,Format}`. `Name` is looked up first
//! among config keys (recursively expanded) and then among the global
//! variables. For a config key, `Format` is a composite template in which
//! `{0}` stands for the expanded value, e.g. `{$Version,v{0}}`. `{0,8}` and
//! `{0,-8}` pad to a width, `{0:spec}` is accepted with the spec ignored (the
//! value is text), and `{{`/`}}` are literal braces. For a global, `Format`
//! is passed to the value's own renderer, e.g. `{$DateTime,yyyyMMdd}`.
//!
//! Cycles fail fast. While expanding, the chain of keys currently being
//! resolved is tracked; naming the current key is a
//! [`SelfReference`](OneBuildError::SelfReference), naming any other key on
//! the chain (including the key the pass started from) is a
//! [`LoopReference`](OneBuildError::LoopReference).

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::OneBuildError;
use crate::globals::{GlobalVariables, MAX_PRECISION};
use crate::map::{ConfigMap, fold_key};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\$([^,{}]+)(?:,((?:\{\{|\}\}|\{[^{}]*\}|[^{}])*))?\}")
        .expect("placeholder pattern")
});

/// Whether `value` contains at least one placeholder.
pub fn has_placeholder(value: &str) -> bool {
    PLACEHOLDER.is_match(value)
}

/// Render a composite `format` with `value` as its only argument.
pub fn apply_format(format: &str, value: &str) -> Result<String, String> {
    let mut out = String::with_capacity(format.len() + value.len());
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut item = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => return Err("unbalanced '{' in format".into()),
                        Some(ch) => item.push(ch),
                    }
                }
                out.push_str(&format_item(&item, value)?);
            }
            '}' => return Err("unbalanced '}' in format".into()),
            _ => out.push(c),
        }
    }
    Ok(out)
}

/// One `index[,alignment][:spec]` item.
fn format_item(item: &str, value: &str) -> Result<String, String> {
    let head = item.split_once(':').map_or(item, |(head, _)| head);
    let (index, alignment) = match head.split_once(',') {
        Some((index, alignment)) => (index.trim(), Some(alignment.trim())),
        None => (head.trim(), None),
    };
    if index != "0" {
        return Err(format!("argument index '{index}' out of range"));
    }
    let Some(alignment) = alignment else {
        return Ok(value.to_string());
    };

    let width: i64 = alignment
        .parse()
        .map_err(|_| format!("invalid alignment '{alignment}'"))?;
    let magnitude = usize::try_from(width.unsigned_abs()).unwrap_or(usize::MAX);
    if magnitude > MAX_PRECISION {
        return Err(format!("alignment {width} exceeds {MAX_PRECISION}"));
    }
    let padding = " ".repeat(magnitude.saturating_sub(value.chars().count()));
    Ok(if width < 0 {
        format!("{value}{padding}")
    } else {
        format!("{padding}{value}")
    })
}

/// Expand placeholders in every value slot of every entry, in place.
///
/// Entries are processed in insertion order; an entry expanded earlier is
/// seen in its expanded form by later lookups.
pub fn resolve_templates(
    map: &mut ConfigMap,
    globals: &GlobalVariables,
) -> Result<(), OneBuildError> {
    for i in 0..map.len() {
        for slot in 0..map.entry_at(i).values.len() {
            let entry = map.entry_at(i);
            let value = &entry.values[slot];
            if !has_placeholder(value) {
                continue;
            }
            let expander = Expander { map, globals };
            let mut chain = vec![entry.key.as_str()];
            let expanded = expander.expand(value, &mut chain)?;
            map.entry_at_mut(i).values[slot] = expanded;
        }
    }
    Ok(())
}

struct Expander<'a> {
    map: &'a ConfigMap,
    globals: &'a GlobalVariables,
}

impl<'a> Expander<'a> {
    /// `chain` holds the keys being resolved: first is the start key, last is
    /// the key `value` belongs to.
    fn expand(&self, value: &str, chain: &mut Vec<&'a str>) -> Result<String, OneBuildError> {
        let mut out = String::with_capacity(value.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(value) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let name = caps.get(1).map_or("", |m| m.as_str());
            let format = caps.get(2).map_or("", |m| m.as_str());
            out.push_str(&value[last..whole.start()]);
            out.push_str(&self.lookup(name, format, chain)?);
            last = whole.end();
        }
        out.push_str(&value[last..]);
        Ok(out)
    }

    fn lookup(
        &self,
        name: &str,
        format: &str,
        chain: &mut Vec<&'a str>,
    ) -> Result<String, OneBuildError> {
        let folded = fold_key(name);
        let current = chain.last().copied().unwrap_or_default();
        if fold_key(current) == folded {
            return Err(OneBuildError::SelfReference {
                key: current.to_string(),
                name: name.to_string(),
            });
        }
        if chain.iter().any(|k| fold_key(k) == folded) {
            return Err(OneBuildError::LoopReference {
                name: name.to_string(),
                start: chain.first().copied().unwrap_or_default().to_string(),
            });
        }

        if let Some(entry) = self.map.entry(name) {
            chain.push(entry.key.as_str());
            let expanded = self.expand(entry.first(), chain);
            chain.pop();
            let expanded = expanded?;
            if format.is_empty() {
                return Ok(expanded);
            }
            return apply_format(format, &expanded).map_err(|reason| {
                OneBuildError::InvalidFormat {
                    name: name.to_string(),
                    format: format.to_string(),
                    reason,
                }
            });
        }

        if let Some(global) = self.globals.get(name) {
            return global
                .render(format)
                .map_err(|reason| OneBuildError::InvalidFormat {
                    name: name.to_string(),
                    format: format.to_string(),
                    reason,
                });
        }

        Err(OneBuildError::TemplateNotFound(name.to_string()))
    }
}
