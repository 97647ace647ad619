//! Clap adapter for onebuild.
//!
//! Compiled only when the `clap` Cargo feature is enabled (on by default).
//! [`BuildArgs`] and [`BuildSubcommand`] embed into a clap
//! `#[derive(Parser)]` struct and give it `files|list|get|plan|gen`
//! subcommands.
//!
//! The only bridge to the core is [`BuildArgs::into_action()`], which
//! converts clap-parsed arguments into an [`Action`](crate::Action). From
//! there, all logic flows through the clap-free
//! [`OneBuildBuilder::handle()`](crate::OneBuildBuilder::handle) API.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::types::{Action, OutputFormat};

/// Clap-derived args for the config commands.
///
/// Flatten this into your app's clap derive:
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(flatten)]
///     build: BuildArgs,
/// }
/// ```
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Extra version tag for this run, appended to the persisted version
    /// label (e.g. "debug").
    #[arg(long, short, global = true)]
    pub tag: Option<String>,

    #[command(subcommand)]
    pub command: Option<BuildSubcommand>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum BuildSubcommand {
    /// List the config files that qualify, in merge order, with scores.
    Files,
    /// Show the resolved configuration.
    List {
        /// Output format.
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
    /// Show one resolved value.
    Get {
        /// Config key, matched case-insensitively (e.g. "Output.Dir").
        key: String,
    },
    /// Show the build plan derived from the resolved configuration.
    Plan {
        /// Scene used when the config lists none. Repeatable.
        #[arg(long = "scene")]
        scenes: Vec<String>,
    },
    /// Generate a commented onebuild.toml.
    Gen {
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl BuildArgs {
    /// Convert clap-parsed args into a framework-agnostic `Action`.
    ///
    /// A bare invocation (no subcommand) maps to a plain `list`. The `--tag`
    /// flag is threaded through to every variant except `gen`.
    pub fn into_action(self) -> Action {
        let tag = self.tag;
        match self.command {
            None => Action::List {
                tag,
                format: OutputFormat::Plain,
            },
            Some(BuildSubcommand::Files) => Action::Files { tag },
            Some(BuildSubcommand::List { format }) => Action::List { tag, format },
            Some(BuildSubcommand::Get { key }) => Action::Get { key, tag },
            Some(BuildSubcommand::Plan { scenes }) => Action::Plan { tag, scenes },
            Some(BuildSubcommand::Gen { output }) => Action::Gen { output },
        }
    }
}
