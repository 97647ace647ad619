use std::path::PathBuf;

/// Output format for a resolved config listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    /// One `key = value` line per entry.
    #[default]
    Plain,
    Json,
    Toml,
}

/// An operation on the resolved config, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
///
/// `tag` is an extra version tag appended to the persisted version label for
/// this call only.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Files {
        tag: Option<String>,
    },
    List {
        tag: Option<String>,
        format: OutputFormat,
    },
    Get {
        key: String,
        tag: Option<String>,
    },
    Plan {
        tag: Option<String>,
        scenes: Vec<String>,
    },
    /// Commented template of the tool's own settings file.
    Gen {
        output: Option<PathBuf>,
    },
}
