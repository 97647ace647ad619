use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde_json::Value;
use tracing::info;

use crate::error::OneBuildError;
use crate::file::{self, CandidateFile};
use crate::globals::{GlobalValue, GlobalVariables};
use crate::map::ConfigMap;
use crate::ops::{self, ActionResult};
use crate::orchestrate::plan::BuildPlan;
use crate::registry::{AppendRegistry, TypeRegistry};
use crate::resolve::{self, ResolutionContext};
use crate::settings::Settings;
use crate::tags::TagWeights;
use crate::types::Action;

/// Default directory of the tagged config files.
pub const DEFAULT_CONFIG_DIR: &str = "Assets/Config";
/// Default version label file name, inside the config directory.
pub const DEFAULT_VERSION_FILE: &str = "version.txt";
/// Default neutral tag.
pub const DEFAULT_BASE_TAG: &str = "base";

/// Entry point for building a onebuild resolver.
pub struct OneBuild;

impl OneBuild {
    pub fn builder() -> OneBuildBuilder {
        OneBuildBuilder::new()
    }
}

/// Builder for resolving tag-layered build configs.
///
/// Controls three things:
///
/// - **Discovery**: [`config_dir()`](Self::config_dir),
///   [`platform()`](Self::platform) and [`base_tag()`](Self::base_tag) decide
///   which files qualify and in which order they merge.
/// - **Merging**: [`append_key()`](Self::append_key) and
///   [`register_type()`](Self::register_type) customize how entries combine
///   and which `type:` annotations are accepted.
/// - **Templates**: [`global()`](Self::global) and
///   [`timestamp()`](Self::timestamp) feed the variables placeholders can
///   reference besides config keys.
pub struct OneBuildBuilder {
    config_dir: PathBuf,
    platform: Option<String>,
    base_tag: Option<String>,
    version_file: PathBuf,
    appends: AppendRegistry,
    types: TypeRegistry,
    globals: Vec<(String, GlobalValue)>,
    timestamp: Option<DateTime<Local>>,
}

impl Default for OneBuildBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OneBuildBuilder {
    fn new() -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            platform: None,
            base_tag: Some(DEFAULT_BASE_TAG.to_string()),
            version_file: PathBuf::from(DEFAULT_VERSION_FILE),
            appends: AppendRegistry::default(),
            types: TypeRegistry::default(),
            globals: Vec::new(),
            timestamp: None,
        }
    }

    /// Directory scanned for config files (default: `Assets/Config`).
    pub fn config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    /// Active platform name. Required before resolving.
    pub fn platform(mut self, platform: &str) -> Self {
        self.platform = Some(platform.to_string());
        self
    }

    /// Neutral tag every resolution matches with weight 0 (default: `base`).
    pub fn base_tag(mut self, tag: &str) -> Self {
        self.base_tag = Some(tag.to_string());
        self
    }

    /// Disable the neutral tag: only version and platform tags qualify.
    pub fn no_base_tag(mut self) -> Self {
        self.base_tag = None;
        self
    }

    /// Version label file. A relative path is taken inside the config
    /// directory.
    pub fn version_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.version_file = path.into();
        self
    }

    /// Join `key` across files with `separator` instead of overriding it.
    pub fn append_key(mut self, key: &str, separator: &str) -> Self {
        self.appends.insert(key, separator);
        self
    }

    /// Make `key` override normally, including the default
    /// `ScriptingDefineSymbols`.
    pub fn no_append_key(mut self, key: &str) -> Self {
        self.appends.remove(key);
        self
    }

    /// Accept `type:<name>` annotations, coercing values with `coercion`.
    pub fn register_type<F>(mut self, name: &str, coercion: F) -> Self
    where
        F: Fn(&[String]) -> Result<Value, String> + 'static,
    {
        self.types.register(name, Box::new(coercion));
        self
    }

    /// Add or replace a template global. Names are case-sensitive.
    pub fn global(mut self, name: &str, value: GlobalValue) -> Self {
        self.globals.push((name.to_string(), value));
        self
    }

    /// Fix the `DateTime` global instead of reading the clock per call.
    pub fn timestamp(mut self, now: DateTime<Local>) -> Self {
        self.timestamp = Some(now);
        self
    }

    /// Apply the tool's own settings on top of the current state.
    pub fn settings(mut self, settings: &Settings) -> Self {
        self.config_dir = settings.config_dir.clone();
        self.version_file = settings.version_file.clone();
        if let Some(platform) = &settings.platform {
            self.platform = Some(platform.clone());
        }
        self.base_tag = Some(settings.base_tag.trim())
            .filter(|t| !t.is_empty())
            .map(String::from);
        for (key, separator) in settings.append.iter().flatten() {
            self.appends.insert(key, separator);
        }
        self
    }

    /// Resolve the effective platform, or error if not set.
    pub fn effective_platform(&self) -> Result<&str, OneBuildError> {
        self.platform
            .as_deref()
            .ok_or(OneBuildError::PlatformRequired)
    }

    /// Path of the version label file.
    pub fn version_path(&self) -> PathBuf {
        if self.version_file.is_absolute() {
            self.version_file.clone()
        } else {
            self.config_dir.join(&self.version_file)
        }
    }

    /// The persisted version label, with `extra` appended for this call.
    pub fn version(&self, extra: Option<&str>) -> Result<String, OneBuildError> {
        let persisted = file::read_version(&self.version_path())?;
        Ok(file::compose_version(&persisted, extra))
    }

    /// Tag weights for `version` and the active platform.
    pub fn weights(&self, version: &str) -> Result<TagWeights, OneBuildError> {
        let platform = self.effective_platform()?;
        Ok(TagWeights::new(self.base_tag.as_deref(), version, platform))
    }

    /// Config files qualifying for `version`, in merge order.
    pub fn select(&self, version: &str) -> Result<Vec<CandidateFile>, OneBuildError> {
        let weights = self.weights(version)?;
        file::select_config_files(&self.config_dir, &weights)
    }

    /// A fresh resolution context for one call.
    fn context(&self) -> Result<ResolutionContext<'_>, OneBuildError> {
        let platform = self.effective_platform()?;
        let now = self.timestamp.unwrap_or_else(Local::now);
        let mut globals = GlobalVariables::standard(now, platform);
        for (name, value) in &self.globals {
            globals.insert(name, value.clone());
        }
        Ok(ResolutionContext {
            appends: &self.appends,
            types: &self.types,
            globals,
        })
    }

    /// Select, merge and template-expand the configs for `version`.
    pub fn resolve(&self, version: &str) -> Result<ConfigMap, OneBuildError> {
        let selected = self.select(version)?;
        info!(
            dir = %self.config_dir.display(),
            %version,
            files = selected.len(),
            "resolving config"
        );
        let files = file::load_config_files(&selected)?;
        let ctx = self.context()?;
        resolve::resolve(files, &ctx)
    }

    /// Resolve and derive the build plan.
    pub fn plan(&self, version: &str, default_scenes: &[String]) -> Result<BuildPlan, OneBuildError> {
        let config = self.resolve(version)?;
        BuildPlan::from_config(&config, self.effective_platform()?, default_scenes)
    }

    /// Handle an [`Action`] and print the result to stdout.
    pub fn handle_and_print(&self, action: &Action) -> Result<(), OneBuildError> {
        let result = self.handle(action)?;
        println!("{result}");
        Ok(())
    }

    /// Handle an [`Action`] (files / list / get / plan / gen).
    pub fn handle(&self, action: &Action) -> Result<ActionResult, OneBuildError> {
        match action {
            Action::Gen { output } => {
                let template = Settings::template();
                match output {
                    Some(path) => {
                        if let Some(parent) = path.parent()
                            && !parent.as_os_str().is_empty()
                        {
                            std::fs::create_dir_all(parent).map_err(|e| {
                                OneBuildError::IoError {
                                    path: parent.to_path_buf(),
                                    source: e,
                                }
                            })?;
                        }
                        std::fs::write(path, &template).map_err(|e| OneBuildError::IoError {
                            path: path.clone(),
                            source: e,
                        })?;
                        Ok(ActionResult::TemplateWritten { path: path.clone() })
                    }
                    None => Ok(ActionResult::Template(template)),
                }
            }
            Action::Files { tag } => {
                let version = self.version(tag.as_deref())?;
                let files = self.select(&version)?;
                Ok(ActionResult::Files { version, files })
            }
            Action::List { tag, format } => {
                let config = self.resolve(&self.version(tag.as_deref())?)?;
                ops::render(&config, &self.types, *format)
            }
            Action::Get { key, tag } => {
                let config = self.resolve(&self.version(tag.as_deref())?)?;
                ops::get_value(&config, key)
            }
            Action::Plan { tag, scenes } => {
                let plan = self.plan(&self.version(tag.as_deref())?, scenes)?;
                Ok(ActionResult::Plan(Box::new(plan)))
            }
        }
    }

    pub fn config_dir_path(&self) -> &Path {
        &self.config_dir
    }
}
