//! Core resolution pipeline: merge config layers and expand templates.
//!
//! Operates on pre-loaded file contents with no I/O, so the full pipeline is
//! testable with synthetic inputs. Steps:
//!
//! 1. Parse each file and merge it over the accumulated map (later files win,
//!    append keys join)
//! 2. Expand `{$Name}` placeholders against the merged map and the globals

use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::OneBuildError;
use crate::globals::GlobalVariables;
use crate::map::ConfigMap;
use crate::merge::merge_document;
use crate::registry::{AppendRegistry, TypeRegistry};
use crate::template::resolve_templates;

/// Everything one resolution call needs besides the files themselves.
///
/// Built fresh per call and dropped when the call returns.
pub struct ResolutionContext<'a> {
    pub appends: &'a AppendRegistry,
    pub types: &'a TypeRegistry,
    pub globals: GlobalVariables,
}

/// Resolve a config from pre-loaded files.
///
/// `files` are in precedence order: first = lowest priority, last = highest.
pub fn resolve(
    files: Vec<(PathBuf, String)>,
    ctx: &ResolutionContext<'_>,
) -> Result<ConfigMap, OneBuildError> {
    let mut map = ConfigMap::new();
    for (path, content) in &files {
        info!(file = %path.display(), "merging config file");
        merge_document(&mut map, path, content, ctx.appends, ctx.types)?;
    }

    resolve_templates(&mut map, &ctx.globals)?;
    debug!(entries = map.len(), config = %map.to_pretty_json(), "resolved config");
    Ok(map)
}
