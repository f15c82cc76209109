//! Shared helpers for the integration tests.
//!
//! [`ScriptedConnection`] stands in for backends that are not compiled in.
//! It keeps a table catalogue and row counts, records every statement, and
//! fails any statement containing one of its configured fragments.

#![allow(dead_code)]

use anyhow::{bail, Result};
use qsql_core::{BackendKind, DriverKind};
use qsqlquery_bench::driver::sqlite::SqliteConnection;
use qsqlquery_bench::driver::{PreparedQuery, SqlConnection, SqlError, SqlValue};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

pub const SUITE_ID: &str = "qsqlquery_test";

pub fn sqlite_memory(name: &str) -> SqliteConnection {
    SqliteConnection::open_in_memory(name).expect("open in-memory SQLite")
}

/// Counters that outlive the connection once it is boxed into a registry.
#[derive(Debug, Default)]
pub struct Probe {
    pub opens: Cell<u32>,
    pub closes: Cell<u32>,
    pub statements: RefCell<Vec<String>>,
}

pub struct ScriptedConnection {
    name: String,
    driver: DriverKind,
    backend: BackendKind,
    open: bool,
    fail_open: bool,
    failing: Vec<String>,
    tables: RefCell<BTreeMap<String, i64>>,
    probe: Rc<Probe>,
}

impl ScriptedConnection {
    pub fn new(name: &str, driver: DriverKind, backend: BackendKind) -> Self {
        Self {
            name: name.to_string(),
            driver,
            backend,
            open: true,
            fail_open: false,
            failing: Vec::new(),
            tables: RefCell::new(BTreeMap::new()),
            probe: Rc::new(Probe::default()),
        }
    }

    /// Any statement containing `fragment` (case-insensitive) fails.
    pub fn failing_on(mut self, fragment: &str) -> Self {
        self.failing.push(fragment.to_ascii_lowercase());
        self
    }

    pub fn failing_to_open(mut self) -> Self {
        self.fail_open = true;
        self.open = false;
        self
    }

    pub fn probe(&self) -> Rc<Probe> {
        Rc::clone(&self.probe)
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.borrow().keys().cloned().collect()
    }

    fn table_key(&self, name: &str) -> Option<String> {
        self.tables
            .borrow()
            .keys()
            .find(|k| k.eq_ignore_ascii_case(name))
            .cloned()
    }

    fn check(&self, sql: &str) -> Result<(), SqlError> {
        if !self.open {
            return Err(SqlError::new(sql, "connection is closed"));
        }
        let lower = sql.to_ascii_lowercase();
        if self.failing.iter().any(|f| lower.contains(f.as_str())) {
            return Err(SqlError::new(sql, "scripted failure"));
        }
        Ok(())
    }
}

/// The word following `keyword` in `sql`, with any `(` suffix removed.
fn object_after<'s>(sql: &'s str, keyword: &str) -> Option<&'s str> {
    let lower = sql.to_ascii_lowercase();
    let start = lower.find(keyword)? + keyword.len();
    sql[start..]
        .split_whitespace()
        .next()
        .map(|w| w.split('(').next().unwrap_or(w))
}

/// Number of value tuples in an INSERT ... VALUES statement.
fn inserted_rows(sql: &str) -> i64 {
    let lower = sql.to_ascii_lowercase();
    let Some(start) = lower.find("values") else {
        return 0;
    };
    let mut depth = 0;
    let mut rows = 0;
    for c in sql[start..].chars() {
        match c {
            '(' => {
                if depth == 0 {
                    rows += 1;
                }
                depth += 1;
            }
            ')' => depth -= 1,
            _ => {}
        }
    }
    rows
}

impl SqlConnection for ScriptedConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn driver(&self) -> &DriverKind {
        &self.driver
    }

    fn backend(&self) -> BackendKind {
        self.backend
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn open(&mut self) -> Result<()> {
        if self.fail_open {
            bail!("scripted open failure for {}", self.name);
        }
        self.probe.opens.set(self.probe.opens.get() + 1);
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.probe.closes.set(self.probe.closes.get() + 1);
        self.open = false;
    }

    fn execute(&self, sql: &str) -> Result<(), SqlError> {
        self.probe.statements.borrow_mut().push(sql.to_string());
        self.check(sql)?;

        let lower = sql.trim_start().to_ascii_lowercase();
        if lower.starts_with("create table") {
            let name = object_after(sql, "create table").unwrap_or_default();
            if self.table_key(name).is_some() {
                return Err(SqlError::new(sql, "table already exists"));
            }
            self.tables.borrow_mut().insert(name.to_string(), 0);
        } else if lower.starts_with("drop table") {
            let name = object_after(sql, "drop table").unwrap_or_default();
            let Some(key) = self.table_key(name) else {
                return Err(SqlError::new(sql, "no such table"));
            };
            self.tables.borrow_mut().remove(&key);
        } else if lower.starts_with("insert into") {
            let name = object_after(sql, "insert into").unwrap_or_default();
            let Some(key) = self.table_key(name) else {
                return Err(SqlError::new(sql, "no such table"));
            };
            *self.tables.borrow_mut().entry(key).or_default() += inserted_rows(sql);
        } else if lower.starts_with("delete from") {
            let name = object_after(sql, "delete from").unwrap_or_default();
            let Some(key) = self.table_key(name) else {
                return Err(SqlError::new(sql, "no such table"));
            };
            self.tables.borrow_mut().insert(key, 0);
        }
        Ok(())
    }

    fn prepare<'c>(&'c self, sql: &str) -> Result<Box<dyn PreparedQuery + 'c>, SqlError> {
        self.check(sql)?;
        let lower = sql.to_ascii_lowercase();
        if !lower.starts_with("select count(*) from") {
            return Err(SqlError::new(sql, "unsupported by the scripted connection"));
        }
        let name = object_after(sql, "from").unwrap_or_default();
        let Some(key) = self.table_key(name) else {
            return Err(SqlError::new(sql, "no such table"));
        };
        let count = self.tables.borrow()[&key];
        Ok(Box::new(ScalarQuery {
            value: SqlValue::Integer(count),
            position: 0,
        }))
    }

    fn tables(&self) -> Result<Vec<String>, SqlError> {
        self.check("-- list tables")?;
        Ok(self.table_names())
    }
}

/// One-row, one-column result.
struct ScalarQuery {
    value: SqlValue,
    position: u8,
}

impl PreparedQuery for ScalarQuery {
    fn exec(&mut self) -> Result<(), SqlError> {
        self.position = 0;
        Ok(())
    }

    fn next(&mut self) -> bool {
        self.position += 1;
        self.position == 1
    }

    fn value(&self, index: usize) -> Result<&SqlValue, SqlError> {
        if self.position == 1 && index == 0 {
            Ok(&self.value)
        } else {
            Err(SqlError::new("select count(*)", "no current row"))
        }
    }

    fn column_count(&self) -> usize {
        1
    }
}

/// A plausible driver for each backend, so every dialect can be exercised.
pub fn driver_for(backend: BackendKind) -> DriverKind {
    match backend {
        BackendKind::MsSqlServer | BackendKind::Sybase | BackendKind::Unknown => DriverKind::Odbc,
        BackendKind::MySqlServer => DriverKind::Mysql,
        BackendKind::PostgreSql => DriverKind::Psql,
        BackendKind::Oracle => DriverKind::Oci,
        BackendKind::Sqlite => DriverKind::Sqlite,
        BackendKind::Interbase => DriverKind::Ibase,
        BackendKind::Db2 => DriverKind::Db2,
        BackendKind::MimerSql => DriverKind::Mimer,
    }
}
