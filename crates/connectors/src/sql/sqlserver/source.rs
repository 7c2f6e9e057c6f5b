use crate::{
    adapter::SourceKind,
    error::ExtractError,
    sql::{
        base::{
            error::DbError,
            row::{ColumnMeta, RawRow},
            source::{RowSink, RowSource},
        },
        sqlserver::{
            config::parse_config,
            data_type::{decode_cell, type_name},
        },
    },
};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use model::core::data_type::TypeCategory;
use std::sync::Arc;
use tiberius::{Client, QueryItem};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::trace;

type MsSqlClient = Client<Compat<TcpStream>>;

pub struct MsSqlSource {
    conn_str: String,
}

impl MsSqlSource {
    pub fn new(conn_str: &str) -> Self {
        MsSqlSource {
            conn_str: conn_str.to_string(),
        }
    }

    async fn connect(&self) -> Result<MsSqlClient, DbError> {
        let config = parse_config(&self.conn_str)?;
        let tcp = TcpStream::connect(config.get_addr()).await?;
        tcp.set_nodelay(true)?;
        Ok(Client::connect(config, tcp.compat_write()).await?)
    }
}

#[async_trait]
impl RowSource for MsSqlSource {
    fn kind(&self) -> SourceKind {
        SourceKind::SqlServer
    }

    async fn stream_rows(&self, sql: &str, sink: RowSink<'_>) -> Result<usize, ExtractError> {
        let mut client = self.connect().await?;
        let mut stream = client.simple_query(sql).await.map_err(DbError::from)?;

        let mut columns: Arc<Vec<ColumnMeta>> = Arc::new(Vec::new());
        let mut count = 0;

        while let Some(item) = stream.try_next().await.map_err(DbError::from)? {
            match item {
                // Only the first result set is extracted.
                QueryItem::Metadata(meta) if meta.result_index() > 0 => break,
                QueryItem::Metadata(meta) => {
                    columns = Arc::new(
                        meta.columns()
                            .iter()
                            .map(|col| {
                                let type_name = type_name(col.column_type());
                                let category = TypeCategory::from_sqlserver_type(&type_name);
                                ColumnMeta::new(col.name(), &type_name, category)
                            })
                            .collect(),
                    );
                }
                QueryItem::Row(row) => {
                    let values = row
                        .cells()
                        .zip(columns.iter())
                        .map(|((_, data), meta)| decode_cell(data, &meta.category))
                        .collect::<Result<Vec<_>, _>>()?;

                    sink(RawRow::new(columns.clone(), values))?;
                    count += 1;
                }
            }
        }

        trace!(rows = count, "SQL Server query drained");
        Ok(count)
    }

    async fn ping(&self) -> Result<(), DbError> {
        let mut client = self.connect().await?;
        client.simple_query("SELECT 1").await?.into_results().await?;
        client.close().await?;
        Ok(())
    }
}
