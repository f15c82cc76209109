//! Named connections shared by every case of a suite.

use crate::config::{BenchConfig, DatabaseConfig};
use crate::driver::{self, SqlConnection};
use anyhow::{anyhow, Result};
use qsql_core::BackendKind;

pub struct ConnectionRegistry {
    pending: Vec<DatabaseConfig>,
    connections: Vec<Box<dyn SqlConnection>>,
}

impl ConnectionRegistry {
    /// Registry for the configured databases. Nothing is opened until
    /// [`open_all`](Self::open_all).
    pub fn from_config(config: &BenchConfig) -> Self {
        Self {
            pending: config.databases.clone(),
            connections: Vec::new(),
        }
    }

    /// Registry over connections that were built elsewhere.
    pub fn from_connections(connections: Vec<Box<dyn SqlConnection>>) -> Self {
        Self {
            pending: Vec::new(),
            connections,
        }
    }

    /// Connects every configured database and opens every registered one.
    /// Connections that cannot be opened are logged and dropped from the
    /// registry. Returns the number of usable connections.
    pub fn open_all(&mut self) -> usize {
        for config in std::mem::take(&mut self.pending) {
            let name = config.connection_name();
            if self.lookup(&name).is_some() {
                log::warn!("Duplicate connection {name} ignored");
                continue;
            }
            match driver::connect(&config) {
                Ok(conn) => {
                    log::info!("Connected {name} ({})", conn.backend());
                    self.connections.push(conn);
                }
                Err(e) => log::warn!("Skipping {name}: {e:#}"),
            }
        }

        self.connections.retain_mut(|conn| match conn.open() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Skipping {}: {e:#}", conn.name());
                false
            }
        });

        self.connections.len()
    }

    pub fn close_all(&mut self) {
        for conn in self.connections.iter_mut() {
            conn.close();
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.connections
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn SqlConnection> {
        self.connections
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut (dyn SqlConnection + 'static)> {
        self.connections
            .iter_mut()
            .find(|c| c.name() == name)
            .map(|c| c.as_mut())
    }

    pub fn backend_kind_of(&self, name: &str) -> Option<BackendKind> {
        self.lookup(name).map(|c| c.backend())
    }

    /// Closes and reopens `name`.
    pub fn reopen(&mut self, name: &str) -> Result<()> {
        let conn = self
            .lookup_mut(name)
            .ok_or_else(|| anyhow!("no connection named {name}"))?;
        conn.close();
        conn.open()
    }
}
