//! # onebuild
//!
//! Inspect tag-layered build configs from the command line.
//!
//! ```sh
//! onebuild --platform Android files --tag debug
//! onebuild --platform Android list --format json
//! onebuild --platform iOS get Output.Dir
//! onebuild --platform Android plan --tag release --scene Assets/Main.unity
//! onebuild gen -o onebuild.toml
//! ```
//!
//! Settings come from `onebuild.toml` in the working directory (or
//! `--settings FILE`) and `ONEBUILD_*` environment variables; `--dir` and
//! `--platform` override both.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use onebuild::{BuildArgs, OneBuild, OneBuildError, Settings};

/// onebuild: resolve layered XML build configs per version and platform.
#[derive(Parser, Debug)]
#[command(name = "onebuild", version)]
struct Cli {
    /// Settings file (default: ./onebuild.toml if present).
    #[arg(long, short, global = true)]
    settings: Option<PathBuf>,

    /// Config directory, overriding settings.
    #[arg(long, short, global = true)]
    dir: Option<PathBuf>,

    /// Active platform, overriding settings.
    #[arg(long, short, global = true)]
    platform: Option<String>,

    /// Log debug output to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(flatten)]
    build: BuildArgs,
}

fn run(cli: Cli) -> Result<(), OneBuildError> {
    let settings = Settings::load(cli.settings.as_deref())?;

    let mut builder = OneBuild::builder().settings(&settings);
    if let Some(dir) = cli.dir {
        builder = builder.config_dir(dir);
    }
    if let Some(platform) = &cli.platform {
        builder = builder.platform(platform);
    }

    builder.handle_and_print(&cli.build.into_action())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("onebuild: logging already initialized");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
