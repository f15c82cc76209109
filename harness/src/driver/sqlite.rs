//! SQLite through `rusqlite`.

use super::{PreparedQuery, SqlConnection, SqlError, SqlValue};
use anyhow::{Context, Result};
use qsql_core::{BackendKind, DriverKind};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Statement};

pub const IN_MEMORY: &str = ":memory:";

pub struct SqliteConnection {
    name: String,
    database: String,
    driver: DriverKind,
    conn: Option<Connection>,
}

impl SqliteConnection {
    /// A closed connection to `database` (a file path or `:memory:`).
    pub fn new(name: &str, database: &str) -> Self {
        Self {
            name: name.to_string(),
            database: database.to_string(),
            driver: DriverKind::Sqlite,
            conn: None,
        }
    }

    /// An open private in-memory database.
    pub fn open_in_memory(name: &str) -> Result<Self> {
        let mut conn = Self::new(name, IN_MEMORY);
        conn.open()?;
        Ok(conn)
    }

    fn handle(&self, sql: &str) -> Result<&Connection, SqlError> {
        self.conn
            .as_ref()
            .ok_or_else(|| SqlError::new(sql, format!("connection {} is closed", self.name)))
    }
}

fn to_value(v: ValueRef<'_>) -> SqlValue {
    match v {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Integer(i),
        ValueRef::Real(r) => SqlValue::Real(r),
        ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
    }
}

impl SqlConnection for SqliteConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn driver(&self) -> &DriverKind {
        &self.driver
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn open(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Ok(());
        }
        let opened = if self.database == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(&self.database)
        };
        let conn = opened.with_context(|| format!("opening {}", self.name))?;
        self.conn = Some(conn);
        log::debug!("Opened {}", self.name);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                log::warn!("Closing {} reported an error: {e}", self.name);
            }
            log::debug!("Closed {}", self.name);
        }
    }

    fn execute(&self, sql: &str) -> Result<(), SqlError> {
        self.handle(sql)?
            .execute_batch(sql)
            .map_err(|e| SqlError::new(sql, e))
    }

    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn PreparedQuery + 'c>, SqlError> {
        let stmt = self
            .handle(sql)?
            .prepare(sql)
            .map_err(|e| SqlError::new(sql, e))?;
        let columns = stmt.column_count();
        Ok(Box::new(SqlitePrepared {
            sql: sql.to_string(),
            stmt,
            columns,
            cells: Vec::new(),
            row_count: 0,
            position: None,
        }))
    }

    fn tables(&self) -> Result<Vec<String>, SqlError> {
        const SQL: &str =
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'";
        let conn = self.handle(SQL)?;
        let mut stmt = conn.prepare(SQL).map_err(|e| SqlError::new(SQL, e))?;
        let names = stmt
            .query_map([], |r| r.get::<_, String>(0))
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| SqlError::new(SQL, e))?;
        Ok(names)
    }
}

/// Prepared statement whose result set is fetched into memory by `exec`.
///
/// Cells are stored row-major in one buffer that keeps its capacity across
/// executions, so re-running the statement does not reallocate it.
struct SqlitePrepared<'c> {
    sql: String,
    stmt: Statement<'c>,
    columns: usize,
    cells: Vec<SqlValue>,
    row_count: usize,
    position: Option<usize>,
}

impl PreparedQuery for SqlitePrepared<'_> {
    fn exec(&mut self) -> Result<(), SqlError> {
        self.cells.clear();
        self.row_count = 0;
        self.position = None;

        let columns = self.columns;
        let mut rows = self
            .stmt
            .query([])
            .map_err(|e| SqlError::new(&self.sql, e))?;
        while let Some(row) = rows.next().map_err(|e| SqlError::new(&self.sql, e))? {
            for i in 0..columns {
                let v = row.get_ref(i).map_err(|e| SqlError::new(&self.sql, e))?;
                self.cells.push(to_value(v));
            }
            self.row_count += 1;
        }
        Ok(())
    }

    fn next(&mut self) -> bool {
        let next = self.position.map_or(0, |p| p + 1);
        if next < self.row_count {
            self.position = Some(next);
            true
        } else {
            self.position = Some(self.row_count);
            false
        }
    }

    fn value(&self, index: usize) -> Result<&SqlValue, SqlError> {
        self.position
            .filter(|p| *p < self.row_count && index < self.columns)
            .and_then(|p| self.cells.get(p * self.columns + index))
            .ok_or_else(|| {
                SqlError::new(&self.sql, format!("no value at column {index} of the current row"))
            })
    }

    fn column_count(&self) -> usize {
        self.columns
    }
}
