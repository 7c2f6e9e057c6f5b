use async_trait::async_trait;
use connectors::{
    adapter::SourceKind,
    error::ExtractError,
    extract::{ExtractionStrategy, Extractor},
    sql::base::{
        error::DbError,
        query::{filter::SqlFilter, template::StaticTemplateProvider},
        row::{ColumnMeta, RawRow, RawValue},
        source::{RowSource, RowSink},
    },
};
use model::core::data_type::TypeCategory;
use std::{
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

/// Renders to `"<offset> <count>"`, which `SalesTable` reads back.
pub const PAGING_TEMPLATE: &str = "{{FROM}} {{COUNT}}";

/// An in-memory sales table honouring the offset and count of each query.
pub struct SalesTable {
    columns: Arc<Vec<ColumnMeta>>,
    rows: usize,
    order_sum: &'static str,
    offsets: Mutex<Vec<usize>>,
    /// Number of leading calls that fail with a connection error.
    failures: AtomicUsize,
    /// Zero-based call numbers that fail with a connection error.
    failing_calls: Vec<usize>,
    calls: AtomicUsize,
    delay: Duration,
}

impl SalesTable {
    pub fn new(rows: usize) -> Self {
        SalesTable {
            columns: Arc::new(vec![
                ColumnMeta::new("VisitId", "INT", TypeCategory::Integer),
                ColumnMeta::new("OrderSum", "MONEY", TypeCategory::Currency),
            ]),
            rows,
            order_sum: "12.50",
            offsets: Mutex::new(Vec::new()),
            failures: AtomicUsize::new(0),
            failing_calls: Vec::new(),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    /// Every row carries this text in its currency column.
    pub fn with_order_sum(mut self, text: &'static str) -> Self {
        self.order_sum = text;
        self
    }

    pub fn failing_first(self, calls: usize) -> Self {
        self.failures.store(calls, Ordering::SeqCst);
        self
    }

    pub fn failing_call(mut self, call: usize) -> Self {
        self.failing_calls.push(call);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Offsets of every query received, failed ones included.
    pub fn offsets(&self) -> Vec<usize> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl RowSource for SalesTable {
    fn kind(&self) -> SourceKind {
        SourceKind::SqlServer
    }

    async fn stream_rows(&self, sql: &str, sink: RowSink<'_>) -> Result<usize, ExtractError> {
        let mut parts = sql.split_whitespace().map(|p| p.parse::<usize>().unwrap());
        let (offset, count) = (parts.next().unwrap(), parts.next().unwrap());
        self.offsets.lock().unwrap().push(offset);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
        }
        if remaining > 0 || self.failing_calls.contains(&call) {
            return Err(ExtractError::Database(DbError::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ))));
        }

        let end = self.rows.min(offset.saturating_add(count));
        let start = offset.min(end);
        for id in start..end {
            sink(RawRow::new(
                self.columns.clone(),
                vec![
                    RawValue::Int(id as i64),
                    RawValue::Text(self.order_sum.to_string()),
                ],
            ))?;
        }
        Ok(end - start)
    }

    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }
}

/// A source whose configuration is wrong beyond retrying.
pub struct BrokenSource;

#[async_trait]
impl RowSource for BrokenSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Postgres
    }

    async fn stream_rows(&self, _sql: &str, _sink: RowSink<'_>) -> Result<usize, ExtractError> {
        Err(ExtractError::Database(DbError::InvalidUrl(
            "password authentication failed for user \"pos\"".into(),
        )))
    }

    async fn ping(&self) -> Result<(), DbError> {
        Err(DbError::InvalidUrl("unreachable".into()))
    }
}

pub fn extractor(source: Arc<dyn RowSource>) -> Arc<Extractor> {
    Arc::new(Extractor::new(
        source,
        Arc::new(StaticTemplateProvider::new(PAGING_TEMPLATE)),
        SqlFilter::default(),
        ExtractionStrategy::Generic,
    ))
}
