//! The benchmark cases.
//!
//! | Case                      | Setup                       | Timed body                      |
//! |---------------------------|-----------------------------|---------------------------------|
//! | `benchmark`               | `(MainKey, OtherTextCol)`   | one INSERT with a fresh key     |
//! | `benchmarkSelectPrepared` | 1000 ints in one INSERT     | exec prepared SELECT, sum rows  |

use crate::driver::SqlConnection;
use crate::fixtures::exec_verified;
use crate::table_scope::TableScope;
use crate::timing::BenchLoop;
use anyhow::{ensure, Context, Result};
use qsql_core::TableNamer;

/// Base name of the per-case scoped table.
pub const SCOPED_TABLE: &str = "benchmark";

/// Rows inserted by [`SelectPreparedThroughput`].
pub const SELECT_ROWS: usize = 1000;

/// One benchmark, run once per connection.
pub trait BenchCase {
    fn name(&self) -> &'static str;

    fn run(
        &self,
        conn: &dyn SqlConnection,
        namer: &TableNamer,
        bench: &mut dyn BenchLoop,
    ) -> Result<()>;
}

pub fn default_cases() -> Vec<Box<dyn BenchCase>> {
    vec![
        Box::new(InsertThroughput),
        Box::new(SelectPreparedThroughput::new(SELECT_ROWS)),
    ]
}

/// Sum of `0..rows`.
pub fn expected_sum(rows: usize) -> i64 {
    (0..rows as i64).sum()
}

/// Single-row INSERTs with strictly increasing keys.
pub struct InsertThroughput;

impl BenchCase for InsertThroughput {
    fn name(&self) -> &'static str {
        "benchmark"
    }

    fn run(
        &self,
        conn: &dyn SqlConnection,
        namer: &TableNamer,
        bench: &mut dyn BenchLoop,
    ) -> Result<()> {
        let scope = TableScope::for_case(conn, namer, SCOPED_TABLE, self.name());
        let table = scope.table_name();

        exec_verified(
            conn,
            &format!(
                "CREATE TABLE {table} (\n\
                 MainKey INT NOT NULL,\n\
                 OtherTextCol VARCHAR(45) NOT NULL,\n\
                 PRIMARY KEY(MainKey))"
            ),
        )?;

        let mut key: u64 = 1;
        bench.run(&mut || {
            exec_verified(
                conn,
                &format!("INSERT INTO {table} VALUES({key}, 'Value{key}')"),
            )?;
            key += 1;
            Ok(())
        })
    }
}

/// Re-executes one prepared SELECT over a fixed table and checks the sum
/// of the fetched column every time.
pub struct SelectPreparedThroughput {
    rows: usize,
}

impl SelectPreparedThroughput {
    pub fn new(rows: usize) -> Self {
        Self { rows }
    }
}

impl BenchCase for SelectPreparedThroughput {
    fn name(&self) -> &'static str {
        "benchmarkSelectPrepared"
    }

    fn run(
        &self,
        conn: &dyn SqlConnection,
        namer: &TableNamer,
        bench: &mut dyn BenchLoop,
    ) -> Result<()> {
        let scope = TableScope::for_case(conn, namer, SCOPED_TABLE, self.name());
        let table = scope.table_name();

        exec_verified(conn, &format!("CREATE TABLE {table} (id INT NOT NULL)"))?;

        let values: Vec<String> = (0..self.rows).map(|i| i.to_string()).collect();
        for sql in conn.dialect().insert_rows(table, &values) {
            exec_verified(conn, &sql)?;
        }
        let expected = expected_sum(self.rows);

        let select = format!("SELECT id FROM {table}");
        let mut query = conn
            .prepare(&select)
            .with_context(|| format!("prepare failed on {}", conn.name()))?;

        bench.run(&mut || {
            query
                .exec()
                .with_context(|| format!("exec failed on {}", conn.name()))?;
            let mut sum = 0i64;
            while query.next() {
                sum += query.value(0)?.to_int();
            }
            ensure!(
                sum == expected,
                "sum mismatch on {}: got {sum}, expected {expected}",
                conn.name()
            );
            Ok(())
        })
    }
}
