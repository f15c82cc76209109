//! Runs after every case: restores fixture rows after cases that change
//! them, and reopens connections a failure may have wedged.

use crate::driver::check_database;
use crate::fixtures;
use crate::registry::ConnectionRegistry;
use anyhow::{anyhow, Result};
use qsql_core::backend::is_fragile;
use qsql_core::TableNamer;
use std::collections::HashMap;

/// Cases that leave the fixture tables with different rows than
/// [`fixtures::populate`] put there.
pub const MUTATING_CASES: [&str; 5] = [
    "numRowsAffected",
    "transactions",
    "size",
    "isActive",
    "lastInsertId",
];

pub fn is_mutating(case: &str) -> bool {
    MUTATING_CASES.contains(&case)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionHealth {
    Healthy,
    Reopening,
}

/// What the hook did after a case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub repopulated: bool,
    pub reopened: bool,
}

#[derive(Debug, Default)]
pub struct CleanupHook {
    health: HashMap<String, ConnectionHealth>,
}

impl CleanupHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn health(&self, connection: &str) -> ConnectionHealth {
        self.health
            .get(connection)
            .copied()
            .unwrap_or(ConnectionHealth::Healthy)
    }

    pub fn after_case(
        &mut self,
        registry: &mut ConnectionRegistry,
        namer: &TableNamer,
        case: &str,
        connection: &str,
        failed: bool,
    ) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();

        let conn = registry
            .lookup(connection)
            .ok_or_else(|| anyhow!("no connection named {connection}"))?;
        let fragile = is_fragile(conn.driver(), conn.backend());

        // A wedged fragile connection fails the repopulate too; the reopen
        // below must still run, so the error is held until the end.
        let repopulated = if is_mutating(case) {
            check_database(conn).and_then(|()| fixtures::populate(conn, namer))
        } else {
            Ok(())
        };
        match &repopulated {
            Ok(()) => report.repopulated = is_mutating(case),
            Err(e) => log::warn!("{connection}: repopulating after {case} failed: {e:#}"),
        }

        if failed && fragile {
            self.health
                .insert(connection.to_string(), ConnectionHealth::Reopening);
            log::info!("{connection}: reopening after failed case {case}");
            registry.reopen(connection)?;
            self.health
                .insert(connection.to_string(), ConnectionHealth::Healthy);
            report.reopened = true;
        }

        repopulated.map(|()| report)
    }
}
