//! Suite lifecycle: fixtures up, every case on every connection, fixtures
//! down.

use crate::cases::{default_cases, BenchCase};
use crate::cleanup::CleanupHook;
use crate::driver::check_database;
use crate::fixtures;
use crate::registry::ConnectionRegistry;
use crate::report::{CaseOutcome, CaseRecord, SuiteReport};
use crate::timing::{BenchLoop, SampleLoop};
use anyhow::{anyhow, Result};
use qsql_core::TableNamer;
use std::fmt;

/// The suite cannot run at all, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip(pub String);

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct Suite {
    registry: ConnectionRegistry,
    namer: TableNamer,
    cases: Vec<Box<dyn BenchCase>>,
    hook: CleanupHook,
    setup_failures: Vec<(String, String)>,
    initialised: bool,
}

impl Suite {
    pub fn new(registry: ConnectionRegistry, suite_id: &str) -> Self {
        Self {
            registry,
            namer: TableNamer::new(suite_id),
            cases: Vec::new(),
            hook: CleanupHook::new(),
            setup_failures: Vec::new(),
            initialised: false,
        }
    }

    pub fn with_default_cases(registry: ConnectionRegistry, suite_id: &str) -> Self {
        let mut suite = Self::new(registry, suite_id);
        for case in default_cases() {
            suite.add_case(case);
        }
        suite
    }

    pub fn add_case(&mut self, case: Box<dyn BenchCase>) {
        self.cases.push(case);
    }

    pub fn case_names(&self) -> Vec<&'static str> {
        self.cases.iter().map(|c| c.name()).collect()
    }

    pub fn namer(&self) -> &TableNamer {
        &self.namer
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn hook(&self) -> &CleanupHook {
        &self.hook
    }

    /// Connections whose fixtures could not be built.
    pub fn setup_failures(&self) -> &[(String, String)] {
        &self.setup_failures
    }

    /// Opens every connection and builds its fixtures. A connection whose
    /// fixtures fail is recorded and the rest carry on.
    pub fn init(&mut self) {
        let opened = self.registry.open_all();
        log::info!("Suite {}: {opened} connection(s)", self.namer.suite_id());

        for name in self.registry.names() {
            let Some(conn) = self.registry.lookup(&name) else {
                continue;
            };
            let result = check_database(conn).and_then(|()| {
                fixtures::drop_all(conn, &self.namer);
                fixtures::create_all(conn, &self.namer)?;
                fixtures::populate(conn, &self.namer)
            });
            if let Err(e) = result {
                log::error!("{name}: fixture setup failed: {e:#}");
                self.setup_failures.push((name, format!("{e:#}")));
            }
        }
        self.initialised = true;
    }

    /// One data row per connection, optionally only those whose driver
    /// name starts with `driver_filter`.
    pub fn data_rows(&self, driver_filter: Option<&str>) -> Result<Vec<String>, Skip> {
        let rows: Vec<String> = self
            .registry
            .names()
            .into_iter()
            .filter(|name| match driver_filter {
                Some(prefix) => self
                    .registry
                    .lookup(name)
                    .is_some_and(|c| c.driver().name().starts_with(&prefix.to_ascii_uppercase())),
                None => true,
            })
            .collect();

        if rows.is_empty() {
            return Err(Skip(match driver_filter {
                None => "No database drivers are available in this configuration".to_string(),
                Some(engine) => format!(
                    "No database drivers of type {engine} are available in this configuration"
                ),
            }));
        }
        Ok(rows)
    }

    /// Runs the case called `case_name` against `connection`, then the cleanup
    /// hook.
    pub fn run_case(
        &mut self,
        case_name: &str,
        connection: &str,
        bench: &mut dyn BenchLoop,
    ) -> CaseOutcome {
        let Suite {
            registry,
            namer,
            cases,
            hook,
            ..
        } = self;

        let Some(case) = cases.iter().find(|c| c.name() == case_name) else {
            return CaseOutcome::Skipped(format!("no case named {case_name}"));
        };

        let result = match registry.lookup(connection) {
            Some(conn) => check_database(conn).and_then(|()| case.run(conn, namer, bench)),
            None => Err(anyhow!("no connection named {connection}")),
        };

        let outcome = match result {
            Ok(()) => CaseOutcome::Passed,
            Err(e) => {
                log::error!("{} on {connection} failed: {e:#}", case.name());
                CaseOutcome::Failed(format!("{e:#}"))
            }
        };

        if registry.lookup(connection).is_some() {
            if let Err(e) =
                hook.after_case(registry, namer, case.name(), connection, outcome.is_failed())
            {
                log::error!("{connection}: cleanup after {} failed: {e:#}", case.name());
            }
        }

        outcome
    }

    /// Every case against every data row, each in a fresh loop from
    /// `make_loop`.
    pub fn run_all(
        &mut self,
        driver_filter: Option<&str>,
        mut make_loop: impl FnMut() -> SampleLoop,
    ) -> SuiteReport {
        if !self.initialised {
            self.init();
        }

        let mut report = SuiteReport {
            setup_failures: self.setup_failures.clone(),
            ..SuiteReport::default()
        };

        let rows = match self.data_rows(driver_filter) {
            Ok(rows) => rows,
            Err(skip) => {
                log::warn!("Skipping suite: {skip}");
                report.skipped = Some(skip.0);
                return report;
            }
        };

        for case in self.case_names() {
            for connection in &rows {
                log::info!("Running {case} on {connection}");
                let mut bench = make_loop();
                let outcome = self.run_case(case, connection, &mut bench);
                report.records.push(CaseRecord {
                    case: case.to_string(),
                    connection: connection.clone(),
                    outcome,
                    timing: bench.into_timing(),
                });
            }
        }

        report
    }

    /// Drops the fixtures on every open connection and closes them all.
    pub fn teardown(&mut self) {
        if !self.initialised {
            return;
        }
        for name in self.registry.names() {
            match self.registry.lookup(&name) {
                Some(conn) if conn.is_open() => fixtures::drop_all(conn, &self.namer),
                _ => log::warn!("{name}: not open, fixtures left in place"),
            }
        }
        self.registry.close_all();
        self.initialised = false;
    }
}

impl Drop for Suite {
    fn drop(&mut self) {
        self.teardown();
    }
}
