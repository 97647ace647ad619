//! Tag-layered build configuration. Drop XML files named after the builds
//! they apply to into one directory, name a version and a platform, and get
//! back one merged, template-expanded mapping.
//!
//! ```ignore
//! let config = OneBuild::builder()
//!     .config_dir("Assets/Config")
//!     .platform("Android")
//!     .resolve("release,cn")?;
//!
//! let out: String = config.get("Output.Dir")?;
//! let dev: bool = config.get_as("Build.Development", false);
//! ```
//!
//! That call picks every file in `Assets/Config` whose name is made only of
//! known tags (`base.xml`, `android.xml`, `release.android.xml`, ...),
//! merges them from least to most specific, and expands `{$Name}`
//! placeholders.
//!
//! # Tags and scores
//!
//! A file's name without its extension, split on `.`, is its tag set:
//! `release.android.xml` carries `release` and `android`. Tags are trimmed,
//! lower-cased and de-duplicated. Each resolution knows three kinds of tag:
//!
//! | Tag | Weight | Source |
//! |-----|--------|--------|
//! | base tag (`base`) | 0 | [`base_tag()`](OneBuildBuilder::base_tag) |
//! | platform | 1 | [`platform()`](OneBuildBuilder::platform) |
//! | version token | 10 | the version string, split on `,` and newlines |
//!
//! A file qualifies only if **every** one of its tags is known; anything
//! else is skipped silently, because a file written for another platform or
//! version is supposed to be invisible. A qualifying file's score is the sum
//! of its tag weights.
//!
//! # Layer order
//!
//! ```text
//! base.xml                  score 0
//!        ↑ overridden by
//! android.xml               score 1
//!        ↑ overridden by
//! release.xml               score 10
//!        ↑ overridden by
//! release.android.xml       score 11
//! ```
//!
//! Files merge in ascending score order, so more specific files win. Equal
//! scores keep file-name order. Every file is sparse: it only lists the keys
//! it changes.
//!
//! # File format
//!
//! Every element directly under the document root is one entry, keyed by its
//! local name. Keys are case-insensitive.
//!
//! ```xml
//! <config>
//!   <Output.Dir>build/{$BuildTargetGroup}</Output.Dir>
//!   <Build.Scenes>
//!     <scene>Assets/Main.unity</scene>
//!     <scene>Assets/Level1.unity</scene>
//!   </Build.Scenes>
//!   <BundleVersionCode xmlns="type:int">42</BundleVersionCode>
//! </config>
//! ```
//!
//! A leaf element holds one value; a container holds one value per child.
//! A `type:<Name>` namespace annotates the entry with a type from the
//! [`TypeRegistry`]; an unregistered name fails the merge.
//!
//! # Append keys
//!
//! Some keys accumulate instead of overriding. By default
//! `ScriptingDefineSymbols` joins with `;`, so `A` in `base.xml` and `B` in
//! `debug.xml` give `A;B`. Add more with
//! [`append_key()`](OneBuildBuilder::append_key).
//!
//! # Templates
//!
//! After merging, every value is scanned for `{$Name}` and
//! `{$Name,Format}`:
//!
//! - a config key expands to its own (expanded) value; `Format` is a
//!   template where `{0}` stands for it, e.g. `{$Version,v{0}}`
//! - otherwise a global: `DateTime` (e.g. `{$DateTime,yyyyMMdd}`),
//!   `BuildTargetGroup`, or anything added with
//!   [`global()`](OneBuildBuilder::global)
//!
//! A key that refers to itself, directly or through other keys, fails with
//! [`OneBuildError::SelfReference`] or [`OneBuildError::LoopReference`]. An
//! unknown name fails with [`OneBuildError::TemplateNotFound`].
//!
//! # Typed access
//!
//! [`ConfigMap`] keeps entries in merge order. [`get()`](ConfigMap::get)
//! fails on a missing key; [`get_as()`](ConfigMap::get_as) converts through
//! [`FromConfigValue`] and falls back to a default (logging why) on a
//! missing key or a bad value. Enums and flag sets plug in through
//! [`ConfigEnum`] and [`config_enum_value!`].
//!
//! # Building
//!
//! The [`orchestrate`] module turns a resolved config into a build: a
//! [`BuildPlan`] from the well-known keys, a [`SetterRegistry`] routing every
//! other key to a toolchain setting, and a priority-ordered [`TaskList`].
//! The toolchain itself stays behind the [`BuildToolchain`] trait.
//!
//! # Clap adapter
//!
//! The `cli` module (behind the `clap` feature, on by default) provides
//! [`BuildArgs`], which converts into a framework-agnostic [`Action`] that
//! [`OneBuildBuilder::handle()`] runs. Without clap:
//!
//! ```toml
//! onebuild = { version = "...", default-features = false }
//! ```
//!
//! # Error handling
//!
//! All fallible operations return [`OneBuildError`]. Resolution is
//! all-or-nothing: the first parse, reference or type error aborts the call.

pub mod error;
pub mod file;
pub mod globals;
pub mod map;
pub mod merge;
pub mod orchestrate;
pub mod registry;
pub mod resolve;
pub mod settings;
pub mod tags;
pub mod template;
pub mod types;
pub mod value;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod ops;

#[cfg(test)]
mod fixtures;

pub use builder::{OneBuild, OneBuildBuilder};
#[cfg(feature = "clap")]
pub use cli::{BuildArgs, BuildSubcommand};
pub use error::OneBuildError;
pub use globals::{GlobalValue, GlobalVariables};
pub use map::{ConfigEntry, ConfigMap};
pub use ops::ActionResult;
pub use orchestrate::plan::BuildPlan;
pub use orchestrate::session::{BuildSession, BuildToolchain, standard_tasks};
pub use orchestrate::setters::SetterRegistry;
pub use orchestrate::tasks::TaskList;
pub use registry::{AppendRegistry, TypeRegistry};
pub use settings::Settings;
pub use types::{Action, OutputFormat};
pub use value::{ConfigEnum, FromConfigValue};
