use model::core::data_type::{ColumnType, TypeCategory};
use thiserror::Error;
use tokio_postgres::error::SqlState;

/// All errors coming from the database/driver layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Low‐level I/O failure while reaching the server.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection string could not be parsed.
    #[error("Invalid connection string: {0}")]
    InvalidUrl(String),

    /// TLS setup failed before the handshake.
    #[error("TLS configuration error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    #[error("SQL Server error: {0}")]
    SqlServer(#[from] tiberius::error::Error),
}

impl DbError {
    /// Whether the failure looks transient: the server was unreachable, the
    /// connection dropped, or the server asked for a retry (deadlock,
    /// serialization failure). Syntax and permission errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            DbError::Io(_) => true,
            DbError::InvalidUrl(_) | DbError::Tls(_) => false,
            DbError::Postgres(err) => is_transient_pg(err),
            DbError::MySql(err) => is_transient_mysql(err),
            DbError::SqlServer(err) => is_transient_mssql(err),
        }
    }
}

fn is_transient_pg(err: &tokio_postgres::Error) -> bool {
    if err.is_closed() {
        return true;
    }

    match err.code() {
        // No SQLSTATE means the failure happened below the protocol.
        None => true,
        Some(code) => matches!(
            *code,
            SqlState::T_R_SERIALIZATION_FAILURE
                | SqlState::T_R_DEADLOCK_DETECTED
                | SqlState::LOCK_NOT_AVAILABLE
                | SqlState::TOO_MANY_CONNECTIONS
                | SqlState::ADMIN_SHUTDOWN
                | SqlState::CRASH_SHUTDOWN
                | SqlState::CANNOT_CONNECT_NOW
                | SqlState::CONNECTION_EXCEPTION
                | SqlState::CONNECTION_FAILURE
        ),
    }
}

fn is_transient_mysql(err: &mysql_async::Error) -> bool {
    // Lock wait timeout, deadlock, lost connection, too many connections.
    const RETRYABLE_CODES: [u16; 8] = [1205, 1213, 2002, 2003, 2006, 2013, 1040, 1042];

    match err {
        mysql_async::Error::Io(_) | mysql_async::Error::Driver(_) => true,
        mysql_async::Error::Server(server) => {
            RETRYABLE_CODES.contains(&server.code)
                || matches!(server.state.as_str(), "40001" | "HYT00" | "08S01")
        }
        _ => false,
    }
}

fn is_transient_mssql(err: &tiberius::error::Error) -> bool {
    use tiberius::error::Error;

    match err {
        Error::Io { .. } | Error::Tls(_) | Error::Routing { .. } | Error::Protocol(_) => true,
        // Deadlock victim, lock request timeout.
        Error::Server(token) => matches!(token.code(), 1205 | 1222),
        _ => false,
    }
}

/// A source value that does not fit the type family its column declares.
/// Aborts the extraction it occurs in.
#[derive(Debug, Error, PartialEq)]
pub enum MappingError {
    #[error("Column '{column}' is declared {category} but holds a {found} value")]
    DataShape {
        column: String,
        category: TypeCategory,
        found: &'static str,
    },

    #[error("Column '{column}' is declared currency but holds '{text}', which is not decimal text")]
    InvalidCurrency { column: String, text: String },

    #[error("Column '{0}' required by the extraction schema is missing from the result")]
    MissingColumn(String),

    #[error("Column '{column}' should be {expected:?} per the extraction schema, found {found}")]
    SchemaMismatch {
        column: String,
        expected: ColumnType,
        found: &'static str,
    },
}
