use crate::{
    adapter::SourceKind,
    error::ExtractError,
    sql::{
        base::{
            error::DbError,
            row::{ColumnMeta, RawRow},
            source::{RowSink, RowSource},
        },
        postgres::{data_type::decode_value, utils::connect_client},
    },
};
use async_trait::async_trait;
use futures_util::{TryStreamExt, pin_mut};
use model::core::data_type::TypeCategory;
use std::sync::Arc;
use tokio_postgres::{Row as PgRow, types::ToSql};
use tracing::trace;

pub struct PgSource {
    url: String,
}

impl PgSource {
    pub fn new(url: &str) -> Self {
        PgSource {
            url: url.to_string(),
        }
    }

    fn columns(row: &PgRow) -> Arc<Vec<ColumnMeta>> {
        let columns = row
            .columns()
            .iter()
            .map(|col| {
                let type_name = col.type_().name();
                ColumnMeta::new(col.name(), type_name, TypeCategory::from_postgres_type(type_name))
            })
            .collect();
        Arc::new(columns)
    }
}

#[async_trait]
impl RowSource for PgSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Postgres
    }

    async fn stream_rows(&self, sql: &str, sink: RowSink<'_>) -> Result<usize, ExtractError> {
        let client = connect_client(&self.url).await?;
        let params: [&(dyn ToSql + Sync); 0] = [];
        let stream = client.query_raw(sql, params).await.map_err(DbError::from)?;
        pin_mut!(stream);

        let mut columns: Option<Arc<Vec<ColumnMeta>>> = None;
        let mut count = 0;

        while let Some(row) = stream.try_next().await.map_err(DbError::from)? {
            let meta = columns.get_or_insert_with(|| Self::columns(&row)).clone();
            let values = row
                .columns()
                .iter()
                .enumerate()
                .map(|(idx, col)| decode_value(&row, idx, col.type_()))
                .collect::<Result<Vec<_>, _>>()?;

            sink(RawRow::new(meta, values))?;
            count += 1;
        }

        trace!(rows = count, "Postgres query drained");
        Ok(count)
    }

    async fn ping(&self) -> Result<(), DbError> {
        let client = connect_client(&self.url).await?;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }
}
