use crate::sql::{
    base::source::RowSource, mysql::source::MySqlSource, postgres::source::PgSource,
    sqlserver::source::MsSqlSource,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};

/// Relational engines the extractor can read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    #[serde(alias = "mssql")]
    SqlServer,
    #[serde(alias = "postgresql", alias = "pg")]
    Postgres,
    #[serde(alias = "mariadb")]
    MySql,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::SqlServer => write!(f, "sqlserver"),
            SourceKind::Postgres => write!(f, "postgres"),
            SourceKind::MySql => write!(f, "mysql"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlserver" | "mssql" => Ok(SourceKind::SqlServer),
            "postgres" | "postgresql" | "pg" => Ok(SourceKind::Postgres),
            "mysql" | "mariadb" => Ok(SourceKind::MySql),
            other => Err(format!("Unsupported source kind: {other}")),
        }
    }
}

pub struct Adapter;

impl Adapter {
    /// Builds the row source for `kind`. No connection is opened here; every
    /// extraction connects on its own.
    pub fn sql(kind: SourceKind, conn_str: &str) -> Arc<dyn RowSource> {
        match kind {
            SourceKind::SqlServer => Arc::new(MsSqlSource::new(conn_str)),
            SourceKind::Postgres => Arc::new(PgSource::new(conn_str)),
            SourceKind::MySql => Arc::new(MySqlSource::new(conn_str)),
        }
    }
}
