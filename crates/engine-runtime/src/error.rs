use connectors::{error::ExtractError, sql::base::error::DbError};
use engine_config::error::SettingsError;
use engine_core::retry::RetryError;
use reqwest::StatusCode;
use thiserror::Error;

/// Failure to obtain the report window from the collector.
#[derive(Debug, Error)]
pub enum PeriodError {
    #[error("Period request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Period endpoint answered {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Malformed period response: {0}")]
    Malformed(String),
}

/// Failure to hand a batch to the collector.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Failed to encode batch: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Delivery request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Delivery endpoint answered {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Everything that can end a push cycle or stop a running mode.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Failed to resolve report period: {0}")]
    Period(#[from] RetryError<PeriodError>),

    #[error("Extraction failed: {0}")]
    Extract(#[from] RetryError<ExtractError>),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] RetryError<DeliveryError>),

    #[error("HTTP client error: {0}")]
    Client(reqwest::Error),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}
