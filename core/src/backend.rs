//! Backend and driver identification.
//!
//! A connection goes through a client *driver* (`QSQLITE`, `QODBC`, ...) and
//! talks to a *backend* (the server product whose SQL dialect applies). Most
//! drivers imply their backend; ODBC connections name it explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The SQL server product a connection ultimately targets.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    MsSqlServer,
    MySqlServer,
    PostgreSql,
    Oracle,
    Sybase,
    Sqlite,
    Interbase,
    Db2,
    MimerSql,
    Unknown,
}

impl BackendKind {
    pub const ALL: [BackendKind; 10] = [
        BackendKind::MsSqlServer,
        BackendKind::MySqlServer,
        BackendKind::PostgreSql,
        BackendKind::Oracle,
        BackendKind::Sybase,
        BackendKind::Sqlite,
        BackendKind::Interbase,
        BackendKind::Db2,
        BackendKind::MimerSql,
        BackendKind::Unknown,
    ];

    /// Parses the names used in configuration files. Matching is
    /// case-insensitive and accepts a few common spellings.
    pub fn parse(raw: &str) -> BackendKind {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mssql" | "mssqlserver" | "sqlserver" => BackendKind::MsSqlServer,
            "mysql" | "mysqlserver" | "mariadb" => BackendKind::MySqlServer,
            "postgres" | "postgresql" | "psql" => BackendKind::PostgreSql,
            "oracle" => BackendKind::Oracle,
            "sybase" => BackendKind::Sybase,
            "sqlite" => BackendKind::Sqlite,
            "interbase" | "firebird" => BackendKind::Interbase,
            "db2" => BackendKind::Db2,
            "mimer" | "mimersql" => BackendKind::MimerSql,
            _ => BackendKind::Unknown,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackendKind::MsSqlServer => "MSSqlServer",
            BackendKind::MySqlServer => "MySqlServer",
            BackendKind::PostgreSql => "PostgreSQL",
            BackendKind::Oracle => "Oracle",
            BackendKind::Sybase => "Sybase",
            BackendKind::Sqlite => "SQLite",
            BackendKind::Interbase => "Interbase",
            BackendKind::Db2 => "DB2",
            BackendKind::MimerSql => "MimerSQL",
            BackendKind::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// The client driver a connection is opened through.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DriverKind {
    Sqlite,
    Psql,
    Mysql,
    Odbc,
    Oci,
    Ibase,
    Db2,
    Mimer,
    Other(String),
}

impl DriverKind {
    /// Parses a driver name such as `QSQLITE` or `QODBC3`.
    pub fn parse(raw: &str) -> DriverKind {
        let upper = raw.trim().to_ascii_uppercase();
        match upper.as_str() {
            "QSQLITE" | "QSQLITE3" | "SQLITE" => DriverKind::Sqlite,
            "QPSQL" | "QPSQL7" => DriverKind::Psql,
            "QMYSQL" | "QMYSQL3" | "QMARIADB" => DriverKind::Mysql,
            "QOCI" | "QOCI8" => DriverKind::Oci,
            "QIBASE" => DriverKind::Ibase,
            "QDB2" => DriverKind::Db2,
            "QMIMER" => DriverKind::Mimer,
            _ if upper.starts_with("QODBC") => DriverKind::Odbc,
            _ => DriverKind::Other(upper),
        }
    }

    /// Canonical driver name, used in connection names and driver filters.
    pub fn name(&self) -> &str {
        match self {
            DriverKind::Sqlite => "QSQLITE",
            DriverKind::Psql => "QPSQL",
            DriverKind::Mysql => "QMYSQL",
            DriverKind::Odbc => "QODBC",
            DriverKind::Oci => "QOCI",
            DriverKind::Ibase => "QIBASE",
            DriverKind::Db2 => "QDB2",
            DriverKind::Mimer => "QMIMER",
            DriverKind::Other(name) => name,
        }
    }

    /// Backend implied by the driver. ODBC can front anything, so it
    /// reports `Unknown` unless configuration says otherwise.
    pub fn default_backend(&self) -> BackendKind {
        match self {
            DriverKind::Sqlite => BackendKind::Sqlite,
            DriverKind::Psql => BackendKind::PostgreSql,
            DriverKind::Mysql => BackendKind::MySqlServer,
            DriverKind::Oci => BackendKind::Oracle,
            DriverKind::Ibase => BackendKind::Interbase,
            DriverKind::Db2 => BackendKind::Db2,
            DriverKind::Mimer => BackendKind::MimerSql,
            DriverKind::Odbc | DriverKind::Other(_) => BackendKind::Unknown,
        }
    }

    pub fn is_odbc(&self) -> bool {
        matches!(self, DriverKind::Odbc)
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Oracle and ODBC connections can be left unusable after a failed
/// statement and have to be reopened before they are used again.
pub fn is_fragile(driver: &DriverKind, backend: BackendKind) -> bool {
    backend == BackendKind::Oracle || driver.is_odbc()
}
