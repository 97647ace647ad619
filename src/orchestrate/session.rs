//! A build run: resolve, apply settings, then hand the plan to a toolchain.

use std::fs;
use std::path::Path;

use tracing::info;

use super::plan::{AssetBundleBuild, AssetBundleOptions, BuildPlan};
use super::setters::SetterRegistry;
use super::tasks::TaskList;
use crate::builder::OneBuildBuilder;
use crate::error::OneBuildError;
use crate::map::ConfigMap;

pub const UPDATE_CONFIG_PRIORITY: i32 = -1000;
pub const CHECK_OUTPUT_PRIORITY: i32 = -999;
pub const BUILD_PLAYER_PRIORITY: i32 = 1;

/// The external build toolchain. It is also the target settings are
/// applied to.
pub trait BuildToolchain {
    /// Scenes used when the config lists none.
    fn default_scenes(&self) -> Vec<String> {
        Vec::new()
    }

    fn clear_log(&mut self) {}

    fn build_player(&mut self, plan: &BuildPlan) -> Result<(), String>;

    fn build_asset_bundles(
        &mut self,
        output_dir: &Path,
        bundles: &[AssetBundleBuild],
        options: AssetBundleOptions,
    ) -> Result<(), String>;

    /// Show the build output to the user.
    fn reveal(&mut self, _path: &Path) {}
}

pub struct BuildSession<T> {
    pub onebuild: OneBuildBuilder,
    pub version: String,
    pub setters: SetterRegistry<T>,
    pub toolchain: T,
    pub config: Option<ConfigMap>,
    pub plan: Option<BuildPlan>,
}

impl<T: BuildToolchain> BuildSession<T> {
    pub fn new(
        onebuild: OneBuildBuilder,
        version: &str,
        setters: SetterRegistry<T>,
        toolchain: T,
    ) -> Self {
        Self {
            onebuild,
            version: version.to_string(),
            setters,
            toolchain,
            config: None,
            plan: None,
        }
    }

    fn derive_plan(&self, config: &ConfigMap) -> Result<BuildPlan, OneBuildError> {
        let platform = self.onebuild.effective_platform()?;
        BuildPlan::from_config(config, platform, &self.toolchain.default_scenes())
    }

    /// Resolve the config, apply it to the toolchain and derive the plan.
    pub fn update_config(&mut self) -> Result<(), OneBuildError> {
        let config = self.onebuild.resolve(&self.version)?;
        let applied = self.setters.apply(&config, &mut self.toolchain)?;
        let plan = self.derive_plan(&config)?;
        info!(applied, output = %plan.output_path.display(), "config updated");
        if plan.clear_log {
            self.toolchain.clear_log();
        }
        self.config = Some(config);
        self.plan = Some(plan);
        Ok(())
    }

    fn ensure_plan(&mut self) -> Result<BuildPlan, OneBuildError> {
        if let Some(plan) = &self.plan {
            return Ok(plan.clone());
        }
        let config = match self.config.take() {
            Some(config) => config,
            None => self.onebuild.resolve(&self.version)?,
        };
        let plan = self.derive_plan(&config)?;
        self.config = Some(config);
        self.plan = Some(plan.clone());
        Ok(plan)
    }

    /// Make sure the output directory exists.
    pub fn check_output(&mut self) -> Result<(), OneBuildError> {
        let plan = self.ensure_plan()?;
        if !plan.output_dir.is_dir() {
            fs::create_dir_all(&plan.output_dir).map_err(|e| OneBuildError::IoError {
                path: plan.output_dir.clone(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Build asset bundles if the plan lists assets, otherwise clear the
    /// previous output and build the player.
    pub fn build_player(&mut self) -> Result<(), OneBuildError> {
        let plan = self.ensure_plan()?;

        if plan.is_asset_bundle_build() {
            let bundles = plan.asset_bundles();
            info!(count = bundles.len(), "building asset bundles");
            return self
                .toolchain
                .build_asset_bundles(&plan.output_dir, &bundles, plan.asset_bundle_options)
                .map_err(OneBuildError::Toolchain);
        }

        if plan.output_path.is_file()
            && let Some(parent) = plan.output_path.parent()
        {
            delete_directory_files(parent)?;
        } else if plan.output_path.is_dir() {
            delete_directory_files(&plan.output_path)?;
        }

        if plan.scenes.is_empty() {
            return Err(OneBuildError::EmptyScenes);
        }

        self.toolchain
            .build_player(&plan)
            .map_err(OneBuildError::Toolchain)?;
        if plan.show_folder {
            self.toolchain.reveal(&plan.output_path);
        }
        Ok(())
    }
}

/// The standard pipeline: update config, check output, build.
pub fn standard_tasks<T: BuildToolchain + 'static>() -> TaskList<BuildSession<T>> {
    let mut tasks = TaskList::new();
    tasks
        .add(
            "update_config",
            UPDATE_CONFIG_PRIORITY,
            BuildSession::update_config,
        )
        .add(
            "check_output",
            CHECK_OUTPUT_PRIORITY,
            BuildSession::check_output,
        )
        .add(
            "build_player",
            BUILD_PLAYER_PRIORITY,
            BuildSession::build_player,
        );
    tasks
}

/// Delete every file below `dir`, keeping the directory tree.
fn delete_directory_files(dir: &Path) -> Result<(), OneBuildError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| OneBuildError::IoError { path, source }
    };
    for entry in fs::read_dir(dir).map_err(io_err(dir))? {
        let path = entry.map_err(io_err(dir))?.path();
        if path.is_dir() {
            delete_directory_files(&path)?;
        } else {
            fs::remove_file(&path).map_err(io_err(&path))?;
        }
    }
    info!(dir = %dir.display(), "cleared previous build output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::OneBuild;
    use crate::fixtures::test::config_dir;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[derive(Debug, Default)]
    struct FakeToolchain {
        company: String,
        scenes: Vec<String>,
        players: Vec<BuildPlan>,
        bundles: Vec<(PathBuf, Vec<AssetBundleBuild>)>,
        revealed: Vec<PathBuf>,
        log_cleared: bool,
        fail_with: Option<String>,
    }

    impl BuildToolchain for FakeToolchain {
        fn default_scenes(&self) -> Vec<String> {
            self.scenes.clone()
        }

        fn clear_log(&mut self) {
            self.log_cleared = true;
        }

        fn build_player(&mut self, plan: &BuildPlan) -> Result<(), String> {
            if let Some(reason) = &self.fail_with {
                return Err(reason.clone());
            }
            self.players.push(plan.clone());
            Ok(())
        }

        fn build_asset_bundles(
            &mut self,
            output_dir: &Path,
            bundles: &[AssetBundleBuild],
            _options: AssetBundleOptions,
        ) -> Result<(), String> {
            self.bundles.push((output_dir.to_path_buf(), bundles.to_vec()));
            Ok(())
        }

        fn reveal(&mut self, path: &Path) {
            self.revealed.push(path.to_path_buf());
        }
    }

    fn setters() -> SetterRegistry<FakeToolchain> {
        let mut setters = SetterRegistry::new();
        setters.register_typed("CompanyName", |t: &mut FakeToolchain, v: String| {
            t.company = v
        });
        setters
    }

    fn session(dir: &TempDir, out: &Path, extra: &str) -> BuildSession<FakeToolchain> {
        std::fs::write(
            dir.path().join("base.xml"),
            format!(
                "<c><CompanyName>Acme</CompanyName><Output.Dir>{}</Output.Dir>\
                 <Output.FileName>game.apk</Output.FileName>{extra}</c>",
                out.display()
            ),
        )
        .unwrap();
        let onebuild = OneBuild::builder()
            .config_dir(dir.path())
            .platform("Android");
        let toolchain = FakeToolchain {
            scenes: vec!["Main.unity".into()],
            ..Default::default()
        };
        BuildSession::new(onebuild, "", setters(), toolchain)
    }

    #[test]
    fn standard_schedule() {
        let mut tasks = standard_tasks::<FakeToolchain>();
        assert_eq!(
            tasks.schedule(),
            vec![
                ("update_config", -1000),
                ("check_output", -999),
                ("build_player", 1)
            ]
        );
    }

    #[test]
    fn full_player_build() {
        let dir = config_dir(&[]);
        let out = TempDir::new().unwrap();
        let out_dir = out.path().join("android");
        let mut session = session(
            &dir,
            &out_dir,
            "<Build.ShowFolder>true</Build.ShowFolder><ClearLog>true</ClearLog>",
        );
        standard_tasks().run(&mut session).unwrap();

        let toolchain = &session.toolchain;
        assert_eq!(toolchain.company, "Acme");
        assert!(toolchain.log_cleared);
        assert_eq!(toolchain.players.len(), 1);
        assert_eq!(toolchain.players[0].scenes, vec!["Main.unity"]);
        assert_eq!(toolchain.players[0].output_path, out_dir.join("game.apk"));
        assert_eq!(toolchain.revealed, vec![out_dir.join("game.apk")]);
        assert!(out_dir.is_dir());
    }

    #[test]
    fn previous_output_is_cleared() {
        let dir = config_dir(&[]);
        let out = TempDir::new().unwrap();
        std::fs::create_dir_all(out.path().join("sub")).unwrap();
        std::fs::write(out.path().join("game.apk"), "old").unwrap();
        std::fs::write(out.path().join("sub/extra.bin"), "old").unwrap();
        let mut session = session(&dir, out.path(), "");

        session.build_player().unwrap();
        assert!(!out.path().join("game.apk").exists());
        assert!(!out.path().join("sub/extra.bin").exists());
        assert!(out.path().join("sub").is_dir());
    }

    #[test]
    fn empty_scenes_fail() {
        let dir = config_dir(&[]);
        let out = TempDir::new().unwrap();
        let mut session = session(&dir, out.path(), "");
        session.toolchain.scenes.clear();
        let err = standard_tasks().run(&mut session).unwrap_err();
        match err {
            OneBuildError::Task { name, source } => {
                assert_eq!(name, "build_player");
                assert!(matches!(*source, OneBuildError::EmptyScenes));
            }
            other => panic!("Expected Task error, got {other:?}"),
        }
    }

    #[test]
    fn asset_bundle_build_skips_player() {
        let dir = config_dir(&[]);
        let out = TempDir::new().unwrap();
        let mut session = session(
            &dir,
            out.path(),
            "<Build.Assets><a>Assets/hero.prefab</a></Build.Assets>",
        );
        standard_tasks().run(&mut session).unwrap();
        assert!(session.toolchain.players.is_empty());
        assert_eq!(session.toolchain.bundles.len(), 1);
        assert_eq!(session.toolchain.bundles[0].1[0].name, "hero");
    }

    #[test]
    fn helper_key_does_not_abort_build() {
        let dir = config_dir(&[]);
        let out = TempDir::new().unwrap();
        let mut session = session(
            &dir,
            out.path(),
            "<Flavor>FULL</Flavor><Build.Scenes>{$Flavor}.unity</Build.Scenes>",
        );
        standard_tasks().run(&mut session).unwrap();
        assert_eq!(session.toolchain.company, "Acme");
        assert_eq!(session.toolchain.players.len(), 1);
        assert_eq!(session.toolchain.players[0].scenes, vec!["FULL.unity"]);
    }

    #[test]
    fn strict_setters_abort_before_build() {
        let dir = config_dir(&[]);
        let out = TempDir::new().unwrap();
        let mut session = session(&dir, out.path(), "<Mystery>1</Mystery>");
        session.setters.strict(true);
        let err = standard_tasks().run(&mut session).unwrap_err();
        assert!(matches!(
            err,
            OneBuildError::Task { ref name, ref source }
                if name == "update_config"
                    && matches!(**source, OneBuildError::UnknownSetting(_))
        ));
        assert!(session.toolchain.players.is_empty());
    }

    #[test]
    fn toolchain_failure_is_reported() {
        let dir = config_dir(&[]);
        let out = TempDir::new().unwrap();
        let mut session = session(&dir, out.path(), "");
        session.toolchain.fail_with = Some("Failed".into());
        let err = session.build_player().unwrap_err();
        assert!(matches!(err, OneBuildError::Toolchain(r) if r == "Failed"));
    }

    #[test]
    fn build_without_update_resolves_lazily() {
        let dir = config_dir(&[]);
        let out = TempDir::new().unwrap();
        let mut session = session(&dir, out.path(), "");
        session.build_player().unwrap();
        assert!(session.config.is_some());
        // setters only run in update_config
        assert_eq!(session.toolchain.company, "");
        assert_eq!(session.toolchain.players.len(), 1);
    }
}
