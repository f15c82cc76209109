//! The SQL execution interface the benchmarks drive.
//!
//! [`SqlConnection`] is the seam between the harness and a client driver.
//! Only SQLite is compiled in ([`sqlite::SqliteConnection`]); connections
//! configured for other drivers fail to open and are left out of the run.

pub mod sqlite;

use crate::config::DatabaseConfig;
use anyhow::{bail, Result};
use qsql_core::dialect::{dialect, Dialect};
use qsql_core::{BackendKind, DriverKind};
use std::fmt;

/// A single column value, as fetched from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Lossy integer conversion: NULL, blobs and non-numeric text give 0.
    pub fn to_int(&self) -> i64 {
        match self {
            SqlValue::Null | SqlValue::Blob(_) => 0,
            SqlValue::Integer(v) => *v,
            SqlValue::Real(v) => *v as i64,
            SqlValue::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

/// A failed statement: what was sent and what the backend said about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlError {
    pub statement: String,
    pub diagnostic: String,
}

impl SqlError {
    pub fn new(statement: &str, diagnostic: impl fmt::Display) -> Self {
        Self {
            statement: statement.to_string(),
            diagnostic: diagnostic.to_string(),
        }
    }
}

impl fmt::Display for SqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (statement: {})", self.diagnostic, self.statement)
    }
}

impl std::error::Error for SqlError {}

/// A statement parsed once and executed any number of times.
///
/// `exec` runs the statement and positions the cursor before the first
/// row; `next` advances it; `value` borrows a column of the current row.
pub trait PreparedQuery {
    fn exec(&mut self) -> Result<(), SqlError>;
    fn next(&mut self) -> bool;
    fn value(&self, index: usize) -> Result<&SqlValue, SqlError>;
    fn column_count(&self) -> usize;
}

pub trait SqlConnection {
    /// Registry name, e.g. `QSQLITE@localhost/:memory:`.
    fn name(&self) -> &str;

    fn driver(&self) -> &DriverKind;

    fn backend(&self) -> BackendKind;

    fn is_open(&self) -> bool;

    fn open(&mut self) -> Result<()>;

    fn close(&mut self);

    fn execute(&self, sql: &str) -> Result<(), SqlError>;

    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn PreparedQuery + 'c>, SqlError>;

    /// Names of the user tables currently visible through the connection.
    fn tables(&self) -> Result<Vec<String>, SqlError>;

    fn dialect(&self) -> &'static Dialect {
        dialect(self.backend())
    }
}

/// Fails unless the connection is usable.
pub fn check_database(conn: &dyn SqlConnection) -> Result<()> {
    if !conn.is_open() {
        bail!("connection {} is not open", conn.name());
    }
    Ok(())
}

/// Runs `sql` and returns every row of its result.
pub fn query_all(conn: &dyn SqlConnection, sql: &str) -> Result<Vec<Vec<SqlValue>>, SqlError> {
    let mut query = conn.prepare(sql)?;
    query.exec()?;
    let mut rows = Vec::new();
    while query.next() {
        let row = (0..query.column_count())
            .map(|i| query.value(i).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Opens a connection for `config` through the matching driver.
pub fn connect(config: &DatabaseConfig) -> Result<Box<dyn SqlConnection>> {
    match config.driver() {
        DriverKind::Sqlite => {
            let mut conn = sqlite::SqliteConnection::new(&config.connection_name(), &config.database);
            conn.open()?;
            Ok(Box::new(conn))
        }
        other => bail!(
            "driver {other} is not available in this build (connection {})",
            config.connection_name()
        ),
    }
}
