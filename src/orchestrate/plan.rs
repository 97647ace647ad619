//! The build plan derived from a resolved config.
//!
//! Well-known keys ([`CUSTOM_KEYS`]) describe the build itself rather than a
//! toolchain setting: output location, scenes, build flags, stack-trace
//! levels and mobile version fields. [`BuildPlan::from_config`] reads them
//! through the typed accessor.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config_enum_value;
use crate::error::OneBuildError;
use crate::map::{ConfigMap, fold_key};
use crate::value::ConfigEnum;

pub const VERSION: &str = "Version";
pub const VERSION_CODE: &str = "VersionCode";
pub const OUTPUT_DIR: &str = "Output.Dir";
pub const OUTPUT_FILE_NAME: &str = "Output.FileName";
pub const BUILD_OPTIONS: &str = "Build.BuildOptions";
pub const ASSET_BUNDLE_OPTIONS: &str = "Build.BuildAssetBundleOptions";
pub const SCENES: &str = "Build.Scenes";
pub const ASSETS: &str = "Build.Assets";
pub const SHOW_FOLDER: &str = "Build.ShowFolder";
pub const CLEAR_LOG: &str = "ClearLog";
pub const IOS_GAME_CENTER: &str = "iOS.GameCenter";

/// Stack-trace keys, one per log type.
pub const LOGGING_KEYS: [(&str, LogType); 5] = [
    ("loggingError", LogType::Error),
    ("loggingAssert", LogType::Assert),
    ("loggingWarning", LogType::Warning),
    ("loggingLog", LogType::Log),
    ("loggingException", LogType::Exception),
];

/// Keys consumed by the plan and never routed to a setter.
pub const CUSTOM_KEYS: [&str; 16] = [
    VERSION,
    VERSION_CODE,
    OUTPUT_DIR,
    OUTPUT_FILE_NAME,
    BUILD_OPTIONS,
    ASSET_BUNDLE_OPTIONS,
    SCENES,
    ASSETS,
    SHOW_FOLDER,
    CLEAR_LOG,
    "loggingError",
    "loggingAssert",
    "loggingWarning",
    "loggingLog",
    "loggingException",
    IOS_GAME_CENTER,
];

/// Case-insensitive membership in [`CUSTOM_KEYS`].
pub fn is_custom_key(key: &str) -> bool {
    let folded = fold_key(key);
    CUSTOM_KEYS.iter().any(|k| fold_key(k) == folded)
}

/// Player build flags. Config text lists names separated by commas or spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildOptions(pub u32);

impl BuildOptions {
    pub const NONE: Self = Self(0);
    pub const DEVELOPMENT: Self = Self(1);
    pub const AUTO_RUN_PLAYER: Self = Self(1 << 2);
    pub const SHOW_BUILT_PLAYER: Self = Self(1 << 3);
    pub const BUILD_ADDITIONAL_STREAMED_SCENES: Self = Self(1 << 4);
    pub const ACCEPT_EXTERNAL_MODIFICATIONS: Self = Self(1 << 5);
    pub const CONNECT_WITH_PROFILER: Self = Self(1 << 8);
    pub const ALLOW_DEBUGGING: Self = Self(1 << 9);
    pub const SYMLINK_LIBRARIES: Self = Self(1 << 10);
    pub const UNCOMPRESSED_ASSET_BUNDLE: Self = Self(1 << 11);
    pub const CONNECT_TO_HOST: Self = Self(1 << 12);
    pub const ENABLE_HEADLESS_MODE: Self = Self(1 << 14);
    pub const BUILD_SCRIPTS_ONLY: Self = Self(1 << 15);
    pub const FORCE_ENABLE_ASSERTIONS: Self = Self(1 << 17);
    pub const COMPRESS_WITH_LZ4: Self = Self(1 << 18);
    pub const COMPRESS_WITH_LZ4_HC: Self = Self(1 << 19);
    pub const STRICT_MODE: Self = Self(1 << 21);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl ConfigEnum for BuildOptions {
    const VARIANTS: &'static [(&'static str, Self)] = &[
        ("None", Self::NONE),
        ("Development", Self::DEVELOPMENT),
        ("AutoRunPlayer", Self::AUTO_RUN_PLAYER),
        ("ShowBuiltPlayer", Self::SHOW_BUILT_PLAYER),
        (
            "BuildAdditionalStreamedScenes",
            Self::BUILD_ADDITIONAL_STREAMED_SCENES,
        ),
        (
            "AcceptExternalModificationsToPlayer",
            Self::ACCEPT_EXTERNAL_MODIFICATIONS,
        ),
        ("ConnectWithProfiler", Self::CONNECT_WITH_PROFILER),
        ("AllowDebugging", Self::ALLOW_DEBUGGING),
        ("SymlinkLibraries", Self::SYMLINK_LIBRARIES),
        ("UncompressedAssetBundle", Self::UNCOMPRESSED_ASSET_BUNDLE),
        ("ConnectToHost", Self::CONNECT_TO_HOST),
        ("EnableHeadlessMode", Self::ENABLE_HEADLESS_MODE),
        ("BuildScriptsOnly", Self::BUILD_SCRIPTS_ONLY),
        ("ForceEnableAssertions", Self::FORCE_ENABLE_ASSERTIONS),
        ("CompressWithLz4", Self::COMPRESS_WITH_LZ4),
        ("CompressWithLz4HC", Self::COMPRESS_WITH_LZ4_HC),
        ("StrictMode", Self::STRICT_MODE),
    ];
    const FLAGS: bool = true;

    fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Asset bundle build flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssetBundleOptions(pub u32);

impl AssetBundleOptions {
    pub const NONE: Self = Self(0);
    pub const UNCOMPRESSED_ASSET_BUNDLE: Self = Self(1);
    pub const DISABLE_WRITE_TYPE_TREE: Self = Self(1 << 3);
    pub const DETERMINISTIC_ASSET_BUNDLE: Self = Self(1 << 4);
    pub const FORCE_REBUILD_ASSET_BUNDLE: Self = Self(1 << 5);
    pub const IGNORE_TYPE_TREE_CHANGES: Self = Self(1 << 6);
    pub const APPEND_HASH_TO_ASSET_BUNDLE_NAME: Self = Self(1 << 7);
    pub const CHUNK_BASED_COMPRESSION: Self = Self(1 << 8);
    pub const STRICT_MODE: Self = Self(1 << 9);
    pub const DRY_RUN_BUILD: Self = Self(1 << 10);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl ConfigEnum for AssetBundleOptions {
    const VARIANTS: &'static [(&'static str, Self)] = &[
        ("None", Self::NONE),
        ("UncompressedAssetBundle", Self::UNCOMPRESSED_ASSET_BUNDLE),
        ("DisableWriteTypeTree", Self::DISABLE_WRITE_TYPE_TREE),
        ("DeterministicAssetBundle", Self::DETERMINISTIC_ASSET_BUNDLE),
        ("ForceRebuildAssetBundle", Self::FORCE_REBUILD_ASSET_BUNDLE),
        ("IgnoreTypeTreeChanges", Self::IGNORE_TYPE_TREE_CHANGES),
        (
            "AppendHashToAssetBundleName",
            Self::APPEND_HASH_TO_ASSET_BUNDLE_NAME,
        ),
        ("ChunkBasedCompression", Self::CHUNK_BASED_COMPRESSION),
        ("StrictMode", Self::STRICT_MODE),
        ("DryRunBuild", Self::DRY_RUN_BUILD),
    ];
    const FLAGS: bool = true;

    fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogType {
    Error,
    Assert,
    Warning,
    Log,
    Exception,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StackTraceLogType {
    None,
    #[default]
    ScriptOnly,
    Full,
}

impl ConfigEnum for StackTraceLogType {
    const VARIANTS: &'static [(&'static str, Self)] = &[
        ("None", Self::None),
        ("ScriptOnly", Self::ScriptOnly),
        ("Full", Self::Full),
    ];
}

config_enum_value!(BuildOptions, AssetBundleOptions, StackTraceLogType);

/// Platform-specific build number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionCode {
    /// Android bundle version code.
    Android(i32),
    /// iOS build number.
    Ios(String),
}

/// One asset bundle: a single asset named after its file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetBundleBuild {
    pub name: String,
    pub assets: Vec<String>,
}

/// Everything a toolchain needs to run one build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildPlan {
    pub output_dir: PathBuf,
    pub output_path: PathBuf,
    pub scenes: Vec<String>,
    pub options: BuildOptions,
    pub asset_bundle_options: AssetBundleOptions,
    /// When present the build produces asset bundles instead of a player.
    pub assets: Option<Vec<String>>,
    pub show_folder: bool,
    pub clear_log: bool,
    pub bundle_version: Option<String>,
    pub version_code: Option<VersionCode>,
    pub stack_traces: Vec<(LogType, StackTraceLogType)>,
}

fn is_platform(platform: &str, name: &str) -> bool {
    platform.trim().eq_ignore_ascii_case(name)
}

impl BuildPlan {
    /// Derive the plan from a resolved config.
    ///
    /// `default_scenes` is used when `Build.Scenes` is absent or blank.
    /// Fails only when `Output.Dir` is missing or a mobile version field is
    /// required but unreadable.
    pub fn from_config(
        config: &ConfigMap,
        platform: &str,
        default_scenes: &[String],
    ) -> Result<Self, OneBuildError> {
        let output_dir = PathBuf::from(config.get(OUTPUT_DIR)?);
        let file_name = config.get_or(OUTPUT_FILE_NAME, "");
        let output_path = if file_name.is_empty() {
            output_dir.clone()
        } else {
            output_dir.join(file_name)
        };

        let scenes: Vec<String> = config
            .get_or(SCENES, "")
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        let scenes = if scenes.is_empty() {
            default_scenes.to_vec()
        } else {
            scenes
        };

        let android = is_platform(platform, "Android");
        let ios = is_platform(platform, "iOS");

        let bundle_version = if (android || ios) && config.contains(VERSION) {
            Some(config.get(VERSION)?)
        } else {
            None
        };

        let version_code = if !config.contains(VERSION_CODE) {
            None
        } else if android {
            Some(VersionCode::Android(config.get_as(VERSION_CODE, 1)))
        } else if ios {
            Some(VersionCode::Ios(config.get(VERSION_CODE)?))
        } else {
            None
        };

        let stack_traces = LOGGING_KEYS
            .iter()
            .filter(|(key, _)| config.contains(key))
            .map(|&(key, log_type)| (log_type, config.get_as(key, StackTraceLogType::ScriptOnly)))
            .collect();

        Ok(Self {
            output_dir,
            output_path,
            scenes,
            options: config.get_as(BUILD_OPTIONS, BuildOptions::NONE),
            asset_bundle_options: config.get_as(ASSET_BUNDLE_OPTIONS, AssetBundleOptions::NONE),
            assets: config
                .contains(ASSETS)
                .then(|| config.get_as(ASSETS, Vec::new())),
            show_folder: config.get_as(SHOW_FOLDER, false),
            clear_log: config.get_as(CLEAR_LOG, false),
            bundle_version,
            version_code,
            stack_traces,
        })
    }

    pub fn is_asset_bundle_build(&self) -> bool {
        self.assets.is_some()
    }

    /// One bundle per listed asset.
    pub fn asset_bundles(&self) -> Vec<AssetBundleBuild> {
        self.assets
            .iter()
            .flatten()
            .map(|asset| AssetBundleBuild {
                name: Path::new(asset)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| asset.clone()),
                assets: vec![asset.clone()],
            })
            .collect()
    }
}

fn flag_names<E: ConfigEnum + PartialEq>(value: E, bits: impl Fn(E) -> u32) -> String {
    let set = bits(value);
    if set == 0 {
        return "None".into();
    }
    E::VARIANTS
        .iter()
        .filter(|(_, v)| bits(*v) != 0 && set & bits(*v) == bits(*v))
        .map(|(n, _)| *n)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for BuildOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&flag_names(*self, |o| o.0))
    }
}

impl fmt::Display for AssetBundleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&flag_names(*self, |o| o.0))
    }
}

impl fmt::Display for BuildPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "output = {}", self.output_path.display())?;
        match &self.assets {
            Some(assets) => {
                writeln!(f, "assets = {}", assets.join(", "))?;
                writeln!(f, "asset_bundle_options = {}", self.asset_bundle_options)?;
            }
            None => {
                writeln!(f, "scenes = {}", self.scenes.join(", "))?;
                writeln!(f, "options = {}", self.options)?;
            }
        }
        if let Some(version) = &self.bundle_version {
            writeln!(f, "bundle_version = {version}")?;
        }
        match &self.version_code {
            Some(VersionCode::Android(code)) => writeln!(f, "version_code = {code}")?,
            Some(VersionCode::Ios(number)) => writeln!(f, "build_number = {number}")?,
            None => {}
        }
        for (log_type, level) in &self.stack_traces {
            writeln!(f, "stack_trace.{log_type:?} = {level:?}")?;
        }
        write!(
            f,
            "show_folder = {}\nclear_log = {}",
            self.show_folder, self.clear_log
        )
    }
}
