//! Standalone benchmark runner that prints the formatted report.
//!
//! Usage:
//!   cargo run --release
//!   cargo run --release -- QSQLITE                  # only SQLite connections
//!   cargo run --release -- --config databases.json  # explicit connection list
//!
//! `QSQL_BENCH_CONFIG`, `QSQL_BENCH_LOG` and `QSQL_BENCH_SAMPLES` may also be
//! set in the environment or in a `.env` file.

use qsqlquery_bench::config::{self, BenchConfig};
use qsqlquery_bench::registry::ConnectionRegistry;
use qsqlquery_bench::report::print_report;
use qsqlquery_bench::suite::Suite;
use qsqlquery_bench::timing::SampleLoop;
use std::env;
use std::path::PathBuf;
use std::process;

const WARMUP_ITERATIONS: u32 = 10;
const SAMPLES: u32 = 100;
const ITERATIONS_PER_SAMPLE: u32 = 10;

struct Args {
    driver_filter: Option<String>,
    config_path: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args {
        driver_filter: None,
        config_path: None,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                parsed.config_path = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            driver => parsed.driver_filter = Some(driver.to_string()),
        }
    }
    Ok(parsed)
}

fn main() {
    let args = parse_args(env::args().skip(1)).unwrap_or_else(|e| {
        eprintln!("{e}");
        eprintln!("usage: qsqlquery-bench [DRIVER] [--config FILE]");
        process::exit(2);
    });

    qsql_core::initialize_logger(config::log_level_from_env(), None).unwrap_or_else(|e| {
        eprintln!("Failed to initialize logger: {}. Exiting.", e);
        process::exit(1);
    });

    let config = BenchConfig::load(args.config_path.as_deref()).unwrap_or_else(|e| {
        log::error!("{e:#}");
        process::exit(1);
    });

    let samples = config::samples_from_env().unwrap_or(SAMPLES);
    println!("Running query benchmarks...");
    println!("  Warmup iterations:      {WARMUP_ITERATIONS}");
    println!("  Samples:                {samples}");
    println!("  Iterations per sample:  {ITERATIONS_PER_SAMPLE}");

    let mut suite = Suite::with_default_cases(
        ConnectionRegistry::from_config(&config),
        &config.suite_id,
    );
    let report = suite.run_all(args.driver_filter.as_deref(), || {
        SampleLoop::new(WARMUP_ITERATIONS, samples, ITERATIONS_PER_SAMPLE)
    });
    suite.teardown();

    print_report(&report);

    if report.failed_count() > 0 {
        process::exit(1);
    }
}
