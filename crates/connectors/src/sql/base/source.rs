use crate::{
    adapter::SourceKind,
    error::ExtractError,
    sql::base::{
        error::{DbError, MappingError},
        row::RawRow,
    },
};
use async_trait::async_trait;

/// Receives rows in result order. Returning an error stops consumption of the
/// result set; the error is surfaced by [`RowSource::stream_rows`].
pub type RowSink<'a> = &'a mut (dyn FnMut(RawRow) -> Result<(), MappingError> + Send);

/// A database the extractor can run rendered queries against.
///
/// Implementations open a connection per call and release it before
/// returning, whatever the outcome.
#[async_trait]
pub trait RowSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Executes `sql` and feeds every row of its first result set to `sink`.
    /// Returns the number of rows delivered.
    async fn stream_rows(&self, sql: &str, sink: RowSink<'_>) -> Result<usize, ExtractError>;

    /// Opens a connection and runs a trivial statement.
    async fn ping(&self) -> Result<(), DbError>;
}
