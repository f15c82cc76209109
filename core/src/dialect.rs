//! Per-backend SQL syntax, as a static table keyed by [`BackendKind`].

use crate::backend::BackendKind;

/// A session statement issued before the fixture tables are created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatement {
    pub sql: &'static str,
    /// Failure of a required statement aborts fixture creation; the others
    /// are fire-and-forget.
    pub required: bool,
}

/// A backend object other than a table that fixture teardown removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraDrop {
    /// Statement prefix, completed with the namespaced object name.
    pub statement: &'static str,
    pub base_name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub backend: BackendKind,
    /// Column attribute that makes an integer key auto-increment.
    pub auto_increment: &'static str,
    /// The key column is declared `serial` instead of `int <auto_increment>`.
    pub serial_key: bool,
    /// Nullable columns must say `null` explicitly.
    pub explicit_null: bool,
    pub session_setup: &'static [SessionStatement],
    /// `DROP TABLE` needs `cascade` to get past dependent objects.
    pub drop_cascade: bool,
    /// Backend-only fixture tables dropped alongside the common list.
    pub extra_tables: &'static [&'static str],
    /// Objects dropped before the tables.
    pub drops_before_tables: &'static [ExtraDrop],
    /// Objects dropped after the tables.
    pub drops_after_tables: &'static [ExtraDrop],
    /// `INSERT ... VALUES (a), (b), ...` is accepted.
    pub multi_row_insert: bool,
}

const BASE: Dialect = Dialect {
    backend: BackendKind::Unknown,
    auto_increment: "",
    serial_key: false,
    explicit_null: false,
    session_setup: &[],
    drop_cascade: false,
    extra_tables: &[],
    drops_before_tables: &[],
    drops_after_tables: &[],
    multi_row_insert: true,
};

static DIALECTS: [Dialect; 10] = [
    Dialect {
        backend: BackendKind::MsSqlServer,
        auto_increment: "IDENTITY",
        explicit_null: true,
        extra_tables: &["qtest_longstr"],
        drops_before_tables: &[ExtraDrop {
            statement: "DROP PROCEDURE ",
            base_name: "test141895_proc",
        }],
        ..BASE
    },
    Dialect {
        backend: BackendKind::MySqlServer,
        auto_increment: "AUTO_INCREMENT",
        // Servers started without a default engine would create MyISAM
        // tables, which ignore transactions.
        session_setup: &[SessionStatement {
            sql: "set table_type=innodb",
            required: false,
        }],
        drops_before_tables: &[ExtraDrop {
            statement: "DROP PROCEDURE IF EXISTS ",
            base_name: "bug6852_proc",
        }],
        ..BASE
    },
    Dialect {
        backend: BackendKind::PostgreSql,
        serial_key: true,
        session_setup: &[SessionStatement {
            sql: "set client_min_messages='warning'",
            required: true,
        }],
        drop_cascade: true,
        extra_tables: &["task_233829"],
        ..BASE
    },
    Dialect {
        backend: BackendKind::Oracle,
        extra_tables: &["qtest_longstr"],
        drops_after_tables: &[ExtraDrop {
            statement: "DROP PACKAGE ",
            base_name: "pkg",
        }],
        multi_row_insert: false,
        ..BASE
    },
    Dialect {
        backend: BackendKind::Sybase,
        auto_increment: "IDENTITY",
        explicit_null: true,
        ..BASE
    },
    Dialect {
        backend: BackendKind::Sqlite,
        extra_tables: &["record_sqlite"],
        ..BASE
    },
    Dialect {
        backend: BackendKind::Interbase,
        multi_row_insert: false,
        ..BASE
    },
    Dialect {
        backend: BackendKind::Db2,
        ..BASE
    },
    Dialect {
        backend: BackendKind::MimerSql,
        drop_cascade: true,
        ..BASE
    },
    BASE,
];

/// Looks up the syntax rules for `backend`.
pub fn dialect(backend: BackendKind) -> &'static Dialect {
    DIALECTS
        .iter()
        .find(|d| d.backend == backend)
        .unwrap_or(&DIALECTS[DIALECTS.len() - 1])
}

impl Dialect {
    /// Declaration of the auto-increment integer key column `name`.
    pub fn key_column(&self, name: &str) -> String {
        if self.serial_key {
            format!("{name} serial NOT NULL")
        } else if self.auto_increment.is_empty() {
            format!("{name} int NOT NULL")
        } else {
            format!("{name} int {} NOT NULL", self.auto_increment)
        }
    }

    /// Declaration of a nullable column.
    pub fn nullable_column(&self, name: &str, sql_type: &str) -> String {
        if self.explicit_null {
            format!("{name} {sql_type} null")
        } else {
            format!("{name} {sql_type}")
        }
    }

    pub fn drop_table(&self, table: &str) -> String {
        if self.drop_cascade {
            format!("drop table {table} cascade")
        } else {
            format!("drop table {table}")
        }
    }

    /// Statements that insert `rows` (each a pre-rendered value tuple body)
    /// into `table`: one multi-row insert where the backend accepts it, one
    /// insert per row otherwise.
    pub fn insert_rows(&self, table: &str, rows: &[String]) -> Vec<String> {
        if rows.is_empty() {
            return Vec::new();
        }
        if self.multi_row_insert {
            let values: Vec<String> = rows.iter().map(|r| format!("({r})")).collect();
            vec![format!("INSERT INTO {table} VALUES {}", values.join(", "))]
        } else {
            rows.iter()
                .map(|r| format!("INSERT INTO {table} VALUES ({r})"))
                .collect()
        }
    }
}
