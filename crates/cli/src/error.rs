use connectors::{error::ExtractError, sql::base::error::DbError};
use engine_config::error::SettingsError;
use engine_runtime::error::SyncError;
use model::period::InstantParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to load settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Failed to open log file: {0}")]
    LogFile(#[from] std::io::Error),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("{0}")]
    Runner(#[from] SyncError),

    #[error("Connection test failed: {0}")]
    Database(#[from] DbError),

    #[error("Failed to render query: {0}")]
    Render(#[from] ExtractError),

    #[error("Invalid date argument: {0}")]
    InvalidDate(#[from] InstantParseError),

    #[error("--count must be greater than zero")]
    InvalidCount,
}
