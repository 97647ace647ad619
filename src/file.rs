//! Config file discovery, selection and loading.
//!
//! # Selection
//!
//! The config directory is flat: every regular file directly inside it is a
//! candidate. Each candidate's name is turned into a tag set (see
//! [`file_tags`](crate::tags::file_tags)) and scored against the run's
//! [`TagWeights`]. Candidates with an unknown tag are silently skipped; a file
//! aimed at another platform or version is invisible, not an error.
//!
//! Qualifying files are returned in **priority-ascending** order: lowest score
//! first, so the resolve pipeline lets later files override earlier ones.
//! Equal scores keep directory order, which is made deterministic by sorting
//! entries by file name before scoring. Hidden files are ignored.
//!
//! # Version file
//!
//! A plain text file next to the configs may hold a persisted version label.
//! [`read_version`] loads it and [`compose_version`] appends an extra tag for
//! one-off builds (e.g. `debug`).

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::OneBuildError;
use crate::tags::{self, TagWeights};

/// A config file that passed tag matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub tags: Vec<String>,
    pub score: u32,
}

/// Scan `dir` (non-recursive) and return qualifying files, lowest score first.
pub fn select_config_files(
    dir: &Path,
    weights: &TagWeights,
) -> Result<Vec<CandidateFile>, OneBuildError> {
    let io_err = |source| OneBuildError::IoError {
        path: dir.to_path_buf(),
        source,
    };

    let mut names: Vec<(String, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
            trace!(path = %path.display(), "skipping non UTF-8 file name");
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        names.push((name, path));
    }
    names.sort_by(|a, b| a.0.cmp(&b.0));

    let mut selected = Vec::new();
    for (name, path) in names {
        let tags = tags::file_tags(&name);
        match weights.score(tags.iter().map(String::as_str)) {
            Some(score) => selected.push(CandidateFile { path, tags, score }),
            None => trace!(file = %name, "skipping config file with unmatched tags"),
        }
    }

    // stable: equal scores keep name order
    selected.sort_by_key(|f| f.score);
    debug!(dir = %dir.display(), count = selected.len(), "selected config files");
    Ok(selected)
}

/// Read the contents of each selected file, preserving order.
pub fn load_config_files(
    files: &[CandidateFile],
) -> Result<Vec<(PathBuf, String)>, OneBuildError> {
    files
        .iter()
        .map(|file| {
            std::fs::read_to_string(&file.path)
                .map(|content| (file.path.clone(), content))
                .map_err(|e| OneBuildError::IoError {
                    path: file.path.clone(),
                    source: e,
                })
        })
        .collect()
}

/// Read the persisted version label. A missing file yields an empty label.
pub fn read_version(path: &Path) -> Result<String, OneBuildError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content.trim().to_string()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(OneBuildError::IoError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Append `extra` to a persisted version label, comma-separated.
pub fn compose_version(persisted: &str, extra: Option<&str>) -> String {
    let persisted = persisted.trim();
    let Some(extra) = extra.map(str::trim).filter(|e| !e.is_empty()) else {
        return persisted.to_string();
    };
    if persisted.is_empty() {
        return extra.to_string();
    }
    if persisted.ends_with(',') {
        format!("{persisted}{extra}")
    } else {
        format!("{persisted},{extra}")
    }
}
