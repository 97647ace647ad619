//! Settings of the tool itself, as opposed to the build configs it resolves.
//!
//! Layers, lowest first: compiled defaults, `onebuild.toml` (or the file
//! passed with `--settings`), then `ONEBUILD_*` environment variables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use confique::Config;
use serde::Serialize;

use crate::error::OneBuildError;

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_SETTINGS_FILE: &str = "onebuild.toml";

#[derive(Config, Serialize, Debug, Clone, PartialEq)]
pub struct Settings {
    /// Directory holding the tagged XML config files.
    #[config(default = "Assets/Config", env = "ONEBUILD_CONFIG_DIR")]
    pub config_dir: PathBuf,

    /// Persisted version label, relative to `config_dir` unless absolute.
    #[config(default = "version.txt", env = "ONEBUILD_VERSION_FILE")]
    pub version_file: PathBuf,

    /// Active platform name, e.g. "Android" or "iOS".
    #[config(env = "ONEBUILD_PLATFORM")]
    pub platform: Option<String>,

    /// Tag every build matches with weight 0. Empty disables it.
    #[config(default = "base")]
    pub base_tag: String,

    /// Extra append-join keys, mapped to their separator.
    pub append: Option<HashMap<String, String>>,
}

impl Settings {
    /// Load settings from `path`, or from [`DEFAULT_SETTINGS_FILE`] if it
    /// exists. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, OneBuildError> {
        let builder = Self::builder().env();
        let builder = match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(OneBuildError::IoError {
                        path: path.to_path_buf(),
                        source: std::io::Error::from(std::io::ErrorKind::NotFound),
                    });
                }
                builder.file(path)
            }
            None => builder.file(DEFAULT_SETTINGS_FILE),
        };
        Ok(builder.load()?)
    }

    /// A commented TOML template of every setting.
    pub fn template() -> String {
        confique::toml::template::<Self>(confique::toml::FormatOptions::default())
    }
}
