//! Fixture tables: created and populated once per connection when the suite
//! starts, dropped when it ends.

use crate::driver::{query_all, SqlConnection};
use anyhow::{Context, Result};
use qsql_core::TableNamer;

pub const QTEST: &str = "qtest";
pub const QTEST_NULL: &str = "qtest_null";

/// Every table the query test-suite may leave behind, so a run that died
/// half-way does not break the next one.
const LEFTOVER_TABLES: [&str; 30] = [
    QTEST,
    QTEST_NULL,
    "qtest_blob",
    "qtest_bittest",
    "qtest_nullblob",
    "qtest_rawtest",
    "qtest_precision",
    "qtest_prepare",
    "qtestj1",
    "qtestj2",
    "char1Select",
    "char1SU",
    "qxmltest",
    "qtest_exerr",
    "qtest_empty",
    "clobby",
    "bindtest",
    "more_results",
    "blobstest",
    "oraRowId",
    "qtest_batch",
    "bug6421",
    "bug5765",
    "bug6852",
    "qtest_lockedtable",
    "Planet",
    "task_250026",
    "task_234422",
    "test141895",
    "qtest_oraOCINumber",
];

/// Created under its upper-cased name.
const UPPER_CASE_TABLE: &str = "bug6421";

/// Rows of `qtest` after [`populate`].
pub const QTEST_ROWS: [(i64, &str, &str); 5] = [
    (1, "VarChar1", "Char1"),
    (2, "VarChar2", "Char2"),
    (3, "VarChar3", "Char3"),
    (4, "VarChar4", "Char4"),
    (5, "VarChar5", "Char5"),
];

/// Rows of `qtest_null` after [`populate`]; `None` is SQL NULL.
pub const QTEST_NULL_ROWS: [(i64, Option<&str>); 4] =
    [(0, None), (1, Some("n")), (2, Some("i")), (3, None)];

/// Runs `sql`, attaching the connection name to a failure.
pub fn exec_verified(conn: &dyn SqlConnection, sql: &str) -> Result<()> {
    conn.execute(sql)
        .with_context(|| format!("statement failed on {}", conn.name()))
}

pub fn count_rows(conn: &dyn SqlConnection, table: &str) -> Result<i64> {
    let sql = format!("select count(*) from {table}");
    let rows = query_all(conn, &sql).with_context(|| format!("counting rows on {}", conn.name()))?;
    Ok(rows
        .first()
        .and_then(|r| r.first())
        .map_or(0, |v| v.to_int()))
}

/// Names of every fixture table [`drop_all`] removes on `conn`.
pub fn fixture_table_names(conn: &dyn SqlConnection, namer: &TableNamer) -> Vec<String> {
    let mut names: Vec<String> = LEFTOVER_TABLES
        .iter()
        .map(|base| {
            let name = namer.table_name(base, conn.name());
            if *base == UPPER_CASE_TABLE {
                name.to_uppercase()
            } else {
                name
            }
        })
        .collect();
    names.extend(
        conn.dialect()
            .extra_tables
            .iter()
            .map(|base| namer.table_name(base, conn.name())),
    );
    names
}

/// Drops each of `tables` that exists. Lookup is case-insensitive; a
/// table that exists but cannot be dropped is logged, never returned.
pub fn safe_drop_tables(conn: &dyn SqlConnection, tables: &[String]) {
    let mut existing = match conn.tables() {
        Ok(t) => t,
        Err(e) => {
            log::warn!("{}: unable to list tables: {e}", conn.name());
            return;
        }
    };

    for table in tables {
        let Some(pos) = existing.iter().position(|t| t.eq_ignore_ascii_case(table)) else {
            continue;
        };
        let actual = existing.swap_remove(pos);
        if let Err(e) = conn.execute(&conn.dialect().drop_table(&actual)) {
            log::warn!("{}: unable to drop table {table}: {e}", conn.name());
        }
    }
}

/// Removes every fixture table and backend object the suite may have
/// created. Best effort: never fails.
pub fn drop_all(conn: &dyn SqlConnection, namer: &TableNamer) {
    let dialect = conn.dialect();

    for extra in dialect.drops_before_tables {
        let sql = format!("{}{}", extra.statement, namer.table_name(extra.base_name, conn.name()));
        if let Err(e) = conn.execute(&sql) {
            log::debug!("{}: {e}", conn.name());
        }
    }

    safe_drop_tables(conn, &fixture_table_names(conn, namer));

    for extra in dialect.drops_after_tables {
        let sql = format!("{}{}", extra.statement, namer.table_name(extra.base_name, conn.name()));
        if let Err(e) = conn.execute(&sql) {
            log::debug!("{}: {e}", conn.name());
        }
    }
}

/// Creates `qtest` and `qtest_null` with the backend's syntax.
pub fn create_all(conn: &dyn SqlConnection, namer: &TableNamer) -> Result<()> {
    let dialect = conn.dialect();

    for setup in dialect.session_setup {
        if setup.required {
            exec_verified(conn, setup.sql)?;
        } else if let Err(e) = conn.execute(setup.sql) {
            log::debug!("{}: optional session setup failed: {e}", conn.name());
        }
    }

    let qtest = namer.table_name(QTEST, conn.name());
    exec_verified(
        conn,
        &format!(
            "create table {qtest} ({}, t_varchar varchar(20), t_char char(20), primary key(id))",
            dialect.key_column("id")
        ),
    )?;

    let qtest_null = namer.table_name(QTEST_NULL, conn.name());
    exec_verified(
        conn,
        &format!(
            "create table {qtest_null} ({}, {})",
            dialect.nullable_column("id", "int"),
            dialect.nullable_column("t_varchar", "varchar(20)")
        ),
    )?;

    log::debug!("{}: created {qtest} and {qtest_null}", conn.name());
    Ok(())
}

/// Replaces the contents of both fixture tables with the fixed rows.
pub fn populate(conn: &dyn SqlConnection, namer: &TableNamer) -> Result<()> {
    let qtest = namer.table_name(QTEST, conn.name());
    let qtest_null = namer.table_name(QTEST_NULL, conn.name());

    if let Err(e) = conn.execute(&format!("delete from {qtest}")) {
        log::debug!("{}: {e}", conn.name());
    }
    for (id, varchar, chr) in QTEST_ROWS {
        exec_verified(
            conn,
            &format!("insert into {qtest} values ({id}, '{varchar}', '{chr}')"),
        )?;
    }

    if let Err(e) = conn.execute(&format!("delete from {qtest_null}")) {
        log::debug!("{}: {e}", conn.name());
    }
    for (id, varchar) in QTEST_NULL_ROWS {
        let value = varchar.map_or("NULL".to_string(), |v| format!("'{v}'"));
        exec_verified(conn, &format!("insert into {qtest_null} values ({id}, {value})"))?;
    }

    Ok(())
}
