use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON or has a value of the wrong type.
    #[error("Malformed settings: {0}")]
    Json(#[from] serde_json::Error),

    /// A required setting is absent or a value is out of range.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SettingsError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        SettingsError::Configuration(message.into())
    }
}
