//! Error taxonomy for loading, resolving and reloading settings.

use std::path::PathBuf;

/// Errors produced by the settings engine.
///
/// Construction-time errors (`Load`, `Yaml`, `Json`, `Validation`) abort
/// construction entirely. `NotFound` and `Conversion` are per-call and
/// recoverable. Reload-time errors never reach `get` callers; they are only
/// logged by the reload task.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings document could not be read.
    #[error("failed to read settings document {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed YAML input.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Malformed JSON input.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed bootstrap configuration.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A layer-shape or terminal-metadata invariant was violated.
    #[error("{}", validation_message(*index, message))]
    Validation {
        index: Option<usize>,
        message: String,
    },

    /// No active layer defines the requested path.
    #[error("The setting '{path}' was not found")]
    NotFound { path: String },

    /// The resolved value does not fit the requested type.
    #[error("The setting '{path}' could not be converted: {source}")]
    Conversion {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A global accessor was used before any instance was registered.
    #[error("The global process settings have not been set")]
    NotConfigured,

    /// The file watcher could not be created or attached.
    #[error("Notify watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// `start_watch` was called on a handle that is already watching.
    #[error("settings are already being watched")]
    AlreadyWatching,

    /// Watching needs a Tokio runtime to host the reload task.
    #[error("watching settings requires a running Tokio runtime")]
    NoRuntime,

    /// The handle was built from an in-memory document and has nothing to reload.
    #[error("settings have no backing file")]
    NoSource,
}

fn validation_message(index: Option<usize>, message: &str) -> String {
    match index {
        Some(i) => format!("Invalid settings layer at index {}: {}", i, message),
        None => message.to_string(),
    }
}

impl SettingsError {
    /// Validation error for the layer at `index`.
    pub fn invalid_layer(index: usize, message: impl Into<String>) -> Self {
        SettingsError::Validation {
            index: Some(index),
            message: message.into(),
        }
    }

    /// Document-level validation error.
    pub fn invalid_document(message: impl Into<String>) -> Self {
        SettingsError::Validation {
            index: None,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SettingsError::NotFound { .. })
    }
}

/// Result alias for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
