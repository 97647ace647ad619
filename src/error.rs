use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OneBuildError {
    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: roxmltree::Error,
    },

    #[error("Self reference in '{key}': {{${name}}} points back at its own key")]
    SelfReference { key: String, name: String },

    #[error("Reference loop: '{name}' is already being resolved (started at '{start}')")]
    LoopReference { name: String, start: String },

    #[error("Template references unknown name: {{${0}}}")]
    TemplateNotFound(String),

    #[error("Invalid format '{format}' for '{name}': {reason}")]
    InvalidFormat {
        name: String,
        format: String,
        reason: String,
    },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Invalid value for '{key}': {reason}")]
    Conversion { key: String, reason: String },

    #[error("Unknown type annotation 'type:{0}' — register it with .register_type()")]
    UnknownType(String),

    #[error("No setter registered for '{0}'")]
    UnknownSetting(String),

    #[error("Setter for '{key}' rejected [{values}]: {reason}")]
    Setter {
        key: String,
        values: String,
        reason: String,
    },

    #[error("Build task '{name}' failed: {source}")]
    Task {
        name: String,
        source: Box<OneBuildError>,
    },

    #[error("Build toolchain failed: {0}")]
    Toolchain(String),

    #[error("Build player scenes empty")]
    EmptyScenes,

    #[error("Platform is required — call .platform() on the builder")]
    PlatformRequired,

    #[error("Settings error: {0}")]
    SettingsError(#[from] confique::Error),

    #[error("Failed to render config as {format}: {reason}")]
    Render { format: String, reason: String },
}
