//! Connection configuration.
//!
//! The database list is read from the JSON file named by
//! `QSQL_BENCH_CONFIG` (a `.env` file in the working directory is honoured).
//! Without one, the suite runs against an in-memory and a temp-file SQLite
//! database.

use anyhow::{Context, Result};
use qsql_core::{BackendKind, DriverKind};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "QSQL_BENCH_CONFIG";
pub const LOG_LEVEL_ENV: &str = "QSQL_BENCH_LOG";
pub const SAMPLES_ENV: &str = "QSQL_BENCH_SAMPLES";

pub const DEFAULT_SUITE_ID: &str = "qsqlquery";

/// One configured connection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub driver: String,
    pub database: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Backend behind the driver; needed for ODBC, inferred otherwise.
    #[serde(default)]
    pub backend: Option<String>,
}

impl DatabaseConfig {
    pub fn sqlite(database: &str) -> Self {
        Self {
            driver: DriverKind::Sqlite.name().to_string(),
            database: database.to_string(),
            host: None,
            port: None,
            user: None,
            password: None,
            backend: None,
        }
    }

    pub fn driver(&self) -> DriverKind {
        DriverKind::parse(&self.driver)
    }

    pub fn backend(&self) -> BackendKind {
        match &self.backend {
            Some(raw) => BackendKind::parse(raw),
            None => self.driver().default_backend(),
        }
    }

    /// `DRIVER@host[:port]/database`, the name connections are registered
    /// and reported under.
    pub fn connection_name(&self) -> String {
        let host = self.host.as_deref().unwrap_or("localhost");
        let port = self.port.map(|p| format!(":{p}")).unwrap_or_default();
        format!("{}@{host}{port}/{}", self.driver().name(), self.database)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    #[serde(default = "default_suite_id")]
    pub suite_id: String,
    #[serde(default)]
    pub databases: Vec<DatabaseConfig>,
}

fn default_suite_id() -> String {
    DEFAULT_SUITE_ID.to_string()
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            suite_id: default_suite_id(),
            databases: default_databases(),
        }
    }
}

fn default_databases() -> Vec<DatabaseConfig> {
    let file = env::temp_dir().join(format!("{DEFAULT_SUITE_ID}_bench.sqlite"));
    vec![
        DatabaseConfig::sqlite(crate::driver::sqlite::IN_MEMORY),
        DatabaseConfig::sqlite(&file.to_string_lossy()),
    ]
}

impl BenchConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: BenchConfig =
            serde_json::from_str(raw).context("parsing benchmark configuration")?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading benchmark configuration {}", path.display()))?;
        Self::from_json(&raw)
    }

    /// Explicit path first, then `QSQL_BENCH_CONFIG`, then defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                log::warn!("Ignoring unreadable .env file: {e}");
            }
        }

        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var(CONFIG_ENV).ok().map(PathBuf::from));

        match path {
            Some(path) => {
                log::info!("Using benchmark configuration {}", path.display());
                Self::load_from_path(&path)
            }
            None => {
                log::info!("No {CONFIG_ENV} set, using default SQLite connections");
                Ok(Self::default())
            }
        }
    }
}

/// Sample count override for the standalone runner.
pub fn samples_from_env() -> Option<u32> {
    env::var(SAMPLES_ENV).ok()?.trim().parse().ok()
}

pub fn log_level_from_env() -> log::LevelFilter {
    env::var(LOG_LEVEL_ENV)
        .map(|raw| qsql_core::parse_log_level(&raw))
        .unwrap_or(log::LevelFilter::Info)
}
