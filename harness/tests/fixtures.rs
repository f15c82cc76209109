//! Integration tests: fixture table lifecycle on SQLite and on every dialect.

mod common;

use common::{driver_for, sqlite_memory, ScriptedConnection, SUITE_ID};
use qsql_core::{BackendKind, DriverKind, TableNamer};
use qsqlquery_bench::driver::{query_all, SqlConnection, SqlValue};
use qsqlquery_bench::fixtures::{
    count_rows, create_all, drop_all, fixture_table_names, populate, QTEST, QTEST_NULL,
};

fn fixture_names(conn: &dyn SqlConnection, namer: &TableNamer) -> Vec<String> {
    let mut names = vec![
        namer.table_name(QTEST, conn.name()),
        namer.table_name(QTEST_NULL, conn.name()),
    ];
    names.sort();
    names
}

fn sorted_tables(conn: &dyn SqlConnection) -> Vec<String> {
    let mut tables = conn.tables().unwrap();
    tables.sort();
    tables
}

// ── SQLite ──────────────────────────────────────────────────────────

#[test]
fn sqlite_create_leaves_exactly_the_fixture_tables() {
    let conn = sqlite_memory("fixtures-create");
    let namer = TableNamer::new(SUITE_ID);

    drop_all(&conn, &namer);
    create_all(&conn, &namer).unwrap();

    assert_eq!(sorted_tables(&conn), fixture_names(&conn, &namer));
}

#[test]
fn sqlite_populate_fixed_rows() {
    let conn = sqlite_memory("fixtures-populate");
    let namer = TableNamer::new(SUITE_ID);
    create_all(&conn, &namer).unwrap();
    populate(&conn, &namer).unwrap();

    let qtest = namer.table_name(QTEST, conn.name());
    assert_eq!(count_rows(&conn, &qtest).unwrap(), 5);

    let qtest_null = namer.table_name(QTEST_NULL, conn.name());
    let rows = query_all(
        &conn,
        &format!("select id, t_varchar from {qtest_null} order by id"),
    )
    .unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], vec![SqlValue::Integer(0), SqlValue::Null]);
    assert_eq!(
        rows[1],
        vec![SqlValue::Integer(1), SqlValue::Text("n".to_string())]
    );
    assert_eq!(
        rows[2],
        vec![SqlValue::Integer(2), SqlValue::Text("i".to_string())]
    );
    assert_eq!(rows[3], vec![SqlValue::Integer(3), SqlValue::Null]);
}

#[test]
fn sqlite_populate_twice_does_not_accumulate() {
    let conn = sqlite_memory("fixtures-repopulate");
    let namer = TableNamer::new(SUITE_ID);
    create_all(&conn, &namer).unwrap();
    populate(&conn, &namer).unwrap();
    populate(&conn, &namer).unwrap();

    assert_eq!(
        count_rows(&conn, &namer.table_name(QTEST, conn.name())).unwrap(),
        5
    );
    assert_eq!(
        count_rows(&conn, &namer.table_name(QTEST_NULL, conn.name())).unwrap(),
        4
    );
}

#[test]
fn sqlite_drop_all_removes_fixtures_and_leftovers() {
    let conn = sqlite_memory("fixtures-drop");
    let namer = TableNamer::new(SUITE_ID);
    create_all(&conn, &namer).unwrap();

    // Leftovers from an earlier run that died half-way.
    let bug6421 = namer.table_name("bug6421", conn.name()).to_uppercase();
    conn.execute(&format!("create table {bug6421} (id int)"))
        .unwrap();
    let planet = namer.table_name("Planet", conn.name());
    conn.execute(&format!("create table {planet} (name varchar(20))"))
        .unwrap();
    let record_sqlite = namer.table_name("record_sqlite", conn.name());
    conn.execute(&format!("create table {record_sqlite} (id int)"))
        .unwrap();

    drop_all(&conn, &namer);
    assert!(conn.tables().unwrap().is_empty());
}

#[test]
fn sqlite_drop_all_leaves_unrelated_tables() {
    let conn = sqlite_memory("fixtures-unrelated");
    let namer = TableNamer::new(SUITE_ID);
    conn.execute("create table keep_me (id int)").unwrap();
    create_all(&conn, &namer).unwrap();

    drop_all(&conn, &namer);
    assert_eq!(conn.tables().unwrap(), vec!["keep_me".to_string()]);
}

#[test]
fn drop_all_is_idempotent() {
    let conn = sqlite_memory("fixtures-idempotent");
    let namer = TableNamer::new(SUITE_ID);
    drop_all(&conn, &namer);
    drop_all(&conn, &namer);
    create_all(&conn, &namer).unwrap();
    drop_all(&conn, &namer);
    drop_all(&conn, &namer);
    assert!(conn.tables().unwrap().is_empty());
}

#[test]
fn create_without_drop_fails_with_statement() {
    let conn = sqlite_memory("fixtures-recreate");
    let namer = TableNamer::new(SUITE_ID);
    create_all(&conn, &namer).unwrap();

    let err = create_all(&conn, &namer).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("create table"), "{message}");
    assert!(message.contains("already exists"), "{message}");
}

// ── Every dialect ───────────────────────────────────────────────────

#[test]
fn every_backend_drop_then_create_leaves_two_tables() {
    let namer = TableNamer::new(SUITE_ID);
    for backend in BackendKind::ALL {
        let conn = ScriptedConnection::new(
            &format!("scripted-{backend}"),
            driver_for(backend),
            backend,
        );
        drop_all(&conn, &namer);
        create_all(&conn, &namer).unwrap();
        assert_eq!(
            sorted_tables(&conn),
            fixture_names(&conn, &namer),
            "backend {backend}"
        );

        populate(&conn, &namer).unwrap();
        assert_eq!(
            count_rows(&conn, &namer.table_name(QTEST, conn.name())).unwrap(),
            5,
            "backend {backend}"
        );

        drop_all(&conn, &namer);
        assert!(conn.tables().unwrap().is_empty(), "backend {backend}");
    }
}

#[test]
fn backend_specific_create_syntax() {
    let namer = TableNamer::new(SUITE_ID);

    let cases = [
        (BackendKind::MySqlServer, "id int AUTO_INCREMENT NOT NULL"),
        (BackendKind::MsSqlServer, "id int IDENTITY NOT NULL"),
        (BackendKind::Sybase, "id int IDENTITY NOT NULL"),
        (BackendKind::PostgreSql, "id serial NOT NULL"),
        (BackendKind::Sqlite, "id int NOT NULL"),
    ];
    for (backend, key_column) in cases {
        let conn = ScriptedConnection::new("scripted", driver_for(backend), backend);
        let probe = conn.probe();
        create_all(&conn, &namer).unwrap();

        let statements = probe.statements.borrow();
        let qtest = namer.table_name(QTEST, conn.name());
        let create = statements
            .iter()
            .find(|s| s.contains(&format!("create table {qtest} ")))
            .expect("qtest created");
        assert!(create.contains(key_column), "{backend}: {create}");
    }
}

#[test]
fn session_setup_per_backend() {
    let namer = TableNamer::new(SUITE_ID);

    let mysql = ScriptedConnection::new("mysql", DriverKind::Mysql, BackendKind::MySqlServer)
        .failing_on("set table_type");
    // Optional on MySQL: a failure there is not a setup failure.
    create_all(&mysql, &namer).unwrap();

    let postgres = ScriptedConnection::new("pg", DriverKind::Psql, BackendKind::PostgreSql)
        .failing_on("client_min_messages");
    let err = create_all(&postgres, &namer).unwrap_err();
    assert!(format!("{err:#}").contains("set client_min_messages='warning'"));
    assert!(postgres.table_names().is_empty());
}

#[test]
fn nullable_columns_spelled_out_on_mssql() {
    let namer = TableNamer::new(SUITE_ID);
    let conn = ScriptedConnection::new("mssql", driver_for(BackendKind::MsSqlServer), BackendKind::MsSqlServer);
    let probe = conn.probe();
    create_all(&conn, &namer).unwrap();

    let qtest_null = namer.table_name(QTEST_NULL, conn.name());
    let statements = probe.statements.borrow();
    assert!(statements.contains(&format!(
        "create table {qtest_null} (id int null, t_varchar varchar(20) null)"
    )));
}

#[test]
fn backend_objects_dropped_around_tables() {
    let namer = TableNamer::new(SUITE_ID);

    let mssql = ScriptedConnection::new("mssql", driver_for(BackendKind::MsSqlServer), BackendKind::MsSqlServer);
    create_all(&mssql, &namer).unwrap();
    let probe = mssql.probe();
    drop_all(&mssql, &namer);
    {
        let statements = probe.statements.borrow();
        let proc_at = statements
            .iter()
            .position(|s| s.starts_with("DROP PROCEDURE "))
            .expect("procedure dropped");
        let table_at = statements
            .iter()
            .position(|s| s.starts_with("drop table "))
            .expect("table dropped");
        assert!(proc_at < table_at);
    }

    let oracle = ScriptedConnection::new("oracle", driver_for(BackendKind::Oracle), BackendKind::Oracle);
    create_all(&oracle, &namer).unwrap();
    let probe = oracle.probe();
    drop_all(&oracle, &namer);
    let statements = probe.statements.borrow();
    assert!(statements
        .last()
        .is_some_and(|s| s.starts_with("DROP PACKAGE ")));
}

#[test]
fn postgres_drops_with_cascade() {
    let namer = TableNamer::new(SUITE_ID);
    let conn = ScriptedConnection::new("pg", driver_for(BackendKind::PostgreSql), BackendKind::PostgreSql);
    let probe = conn.probe();
    create_all(&conn, &namer).unwrap();
    drop_all(&conn, &namer);

    let statements = probe.statements.borrow();
    let drops: Vec<&String> = statements
        .iter()
        .filter(|s| s.starts_with("drop table "))
        .collect();
    assert_eq!(drops.len(), 2);
    assert!(drops.iter().all(|s| s.ends_with(" cascade")));
}

#[test]
fn fixture_list_includes_backend_extras() {
    let namer = TableNamer::new(SUITE_ID);
    let sqlite = ScriptedConnection::new("c", driver_for(BackendKind::Sqlite), BackendKind::Sqlite);
    let pg = ScriptedConnection::new("c", driver_for(BackendKind::PostgreSql), BackendKind::PostgreSql);

    let sqlite_names = fixture_table_names(&sqlite, &namer);
    let pg_names = fixture_table_names(&pg, &namer);
    assert!(sqlite_names.contains(&namer.table_name("record_sqlite", "c")));
    assert!(!pg_names.contains(&namer.table_name("record_sqlite", "c")));
    assert!(pg_names.contains(&namer.table_name("task_233829", "c")));
    assert!(sqlite_names.contains(&namer.table_name("bug6421", "c").to_uppercase()));
}
