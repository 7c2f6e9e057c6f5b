use crate::{
    adapter::SourceKind,
    error::ExtractError,
    sql::{
        base::{
            error::DbError,
            row::{ColumnMeta, RawRow},
            source::{RowSink, RowSource},
        },
        mysql::data_type::{category, decode_value, type_name},
    },
};
use async_trait::async_trait;
use mysql_async::{Conn, Opts, Value as MySqlValue, prelude::*};
use std::sync::Arc;
use tracing::{trace, warn};

pub struct MySqlSource {
    url: String,
}

impl MySqlSource {
    pub fn new(url: &str) -> Self {
        MySqlSource {
            url: url.to_string(),
        }
    }

    async fn connect(&self) -> Result<Conn, DbError> {
        let opts = Opts::from_url(&self.url).map_err(|e| DbError::InvalidUrl(e.to_string()))?;
        Ok(Conn::new(opts).await?)
    }

    async fn drain(conn: &mut Conn, sql: &str, sink: RowSink<'_>) -> Result<usize, ExtractError> {
        // Prepared execution yields typed binary-protocol values.
        let mut result = conn.exec_iter(sql, ()).await.map_err(DbError::from)?;
        let columns: Arc<Vec<ColumnMeta>> = Arc::new(
            result
                .columns_ref()
                .iter()
                .map(|col| {
                    let type_name = type_name(col);
                    ColumnMeta::new(&col.name_str(), &type_name, category(&type_name))
                })
                .collect(),
        );

        let mut count = 0;
        while let Some(mut row) = result.next().await.map_err(DbError::from)? {
            let values = columns
                .iter()
                .enumerate()
                .map(|(idx, col)| {
                    let value = row.take::<MySqlValue, _>(idx).unwrap_or(MySqlValue::NULL);
                    decode_value(value, &col.category)
                })
                .collect();

            sink(RawRow::new(columns.clone(), values))?;
            count += 1;
        }

        Ok(count)
    }
}

#[async_trait]
impl RowSource for MySqlSource {
    fn kind(&self) -> SourceKind {
        SourceKind::MySql
    }

    async fn stream_rows(&self, sql: &str, sink: RowSink<'_>) -> Result<usize, ExtractError> {
        let mut conn = self.connect().await?;
        let outcome = Self::drain(&mut conn, sql, sink).await;

        if let Err(error) = conn.disconnect().await {
            warn!(%error, "MySQL disconnect failed");
        }

        if let Ok(count) = &outcome {
            trace!(rows = count, "MySQL query drained");
        }
        outcome
    }

    async fn ping(&self) -> Result<(), DbError> {
        let mut conn = self.connect().await?;
        conn.ping().await?;
        conn.disconnect().await?;
        Ok(())
    }
}
