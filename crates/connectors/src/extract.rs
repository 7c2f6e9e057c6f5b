use crate::{
    error::ExtractError,
    sql::base::{
        error::MappingError,
        query::{
            filter::SqlFilter,
            template::{QueryTemplateProvider, render_query},
        },
        row::RawRow,
        source::RowSource,
    },
};
use model::{
    core::{
        data_type::{ColumnSpec, ColumnType},
        value::Value,
    },
    pagination::cursor::PageCursor,
    period::ReportWindow,
    records::{batch::Batch, record::Record},
};
use std::{sync::Arc, time::Instant};
use tracing::debug;

/// How mapped rows are shaped before they leave the extractor.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ExtractionStrategy {
    /// Every column the query returns, as mapped.
    #[default]
    Generic,
    /// Exactly the declared columns, in declared order.
    Fixed(Vec<ColumnSpec>),
}

impl ExtractionStrategy {
    pub fn apply(&self, record: Record) -> Result<Record, MappingError> {
        match self {
            ExtractionStrategy::Generic => Ok(record),
            ExtractionStrategy::Fixed(columns) => project(&record, columns),
        }
    }
}

fn project(record: &Record, columns: &[ColumnSpec]) -> Result<Record, MappingError> {
    let mut projected = Record::with_capacity(columns.len());

    for spec in columns {
        let value = record
            .get_ignore_case(&spec.name)
            .ok_or_else(|| MappingError::MissingColumn(spec.name.clone()))?;

        let value = match (spec.column_type, value) {
            (_, Value::Null) => Value::Null,
            (ColumnType::Int, Value::Int(v)) => Value::Int(*v),
            (ColumnType::Float, Value::Float(v)) => Value::Float(*v),
            (ColumnType::Float, Value::Int(v)) => Value::Float(*v as f64),
            (ColumnType::Bool, Value::Boolean(v)) => Value::Boolean(*v),
            (ColumnType::Text, Value::String(v)) => Value::String(v.clone()),
            (ColumnType::Timestamp, Value::Timestamp(v)) => Value::Timestamp(v.clone()),
            (expected, other) => {
                return Err(MappingError::SchemaMismatch {
                    column: spec.name.clone(),
                    expected,
                    found: other.kind(),
                });
            }
        };

        projected.insert(spec.name.clone(), value);
    }

    Ok(projected)
}

/// Produces one page of records for a window: loads the template, renders
/// it, runs it against the source, and maps every row.
pub struct Extractor {
    source: Arc<dyn RowSource>,
    templates: Arc<dyn QueryTemplateProvider>,
    filter: SqlFilter,
    strategy: ExtractionStrategy,
}

impl Extractor {
    pub fn new(
        source: Arc<dyn RowSource>,
        templates: Arc<dyn QueryTemplateProvider>,
        filter: SqlFilter,
        strategy: ExtractionStrategy,
    ) -> Self {
        Extractor {
            source,
            templates,
            filter,
            strategy,
        }
    }

    /// Renders the query for a page without running it.
    pub async fn render(
        &self,
        window: &ReportWindow,
        cursor: PageCursor,
    ) -> Result<String, ExtractError> {
        let template = self
            .templates
            .template()
            .await
            .map_err(ExtractError::Template)?;
        Ok(render_query(&template, window, cursor, &self.filter))
    }

    /// Fetches the page at `cursor`. An empty batch means the window has no
    /// rows at or past this offset. Any row that fails mapping fails the
    /// whole page; no partial batch is returned.
    pub async fn extract(
        &self,
        window: &ReportWindow,
        cursor: PageCursor,
    ) -> Result<Batch, ExtractError> {
        let sql = self.render(window, cursor).await?;
        let start = Instant::now();

        let strategy = &self.strategy;
        let mut records = Vec::with_capacity(cursor.page_size);
        let mut sink = |row: RawRow| -> Result<(), MappingError> {
            let record = strategy.apply(row.into_record()?)?;
            records.push(record);
            Ok(())
        };

        self.source.stream_rows(&sql, &mut sink).await?;

        debug!(
            offset = cursor.offset,
            rows = records.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Extracted page"
        );

        Ok(Batch::new(records))
    }

    pub fn source(&self) -> &Arc<dyn RowSource> {
        &self.source
    }

    pub fn filter(&self) -> &SqlFilter {
        &self.filter
    }
}
