//! Query-execution benchmarks
//!
//! Drives a SQL client layer through two hot paths on every configured
//! connection:
//! - **benchmark**: single-row INSERT throughput into a fresh table
//! - **benchmarkSelectPrepared**: re-executing one prepared SELECT over
//!   1000 rows and fetching every row
//!
//! Each connection gets the `qtest` / `qtest_null` fixture tables for the
//! duration of the suite; each case works in a table scoped to its run.
//!
//! Run benchmarks: `cargo bench`
//! Run the standalone report: `cargo run --release -- [DRIVER] [--config FILE]`
//! Run tests: `cargo test`

pub mod cases;
pub mod cleanup;
pub mod config;
pub mod driver;
pub mod fixtures;
pub mod registry;
pub mod report;
pub mod suite;
pub mod table_scope;
pub mod timing;
