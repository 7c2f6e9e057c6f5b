use crate::sql::base::error::{DbError, MappingError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The query template could not be read.
    #[error("Failed to load query template: {0}")]
    Template(#[source] std::io::Error),

    /// The database could not be reached or rejected the query.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// A row did not match its declared column types.
    #[error("Data shape error: {0}")]
    Mapping(#[from] MappingError),
}

impl ExtractError {
    /// Whether running the same extraction again may succeed.
    /// Template and shape problems will not go away on their own.
    pub fn is_transient(&self) -> bool {
        match self {
            ExtractError::Database(err) => err.is_transient(),
            ExtractError::Template(_) | ExtractError::Mapping(_) => false,
        }
    }
}
