//! # twstock Warehouse
//!
//! DuckDB-backed storage for the Taiwan stock-market ETL pipeline.
//!
//! ## Overview
//!
//! - **Migrations**: the six destination tables are created by versioned
//!   migrations on open.
//! - **Connection routing**: [`ConnectionRouter`] owns the single live
//!   connection of a run and checks its liveness before every access.
//! - **Batch writers**: [`write_batch`] loads a whole validated batch in one
//!   transaction, either appending or upserting.
//! - **Lookups**: read-only, parameterized reads by identifier and date range
//!   capped at a row limit.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use twstock_warehouse::{RouterConfig, Warehouse, WarehouseConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open(WarehouseConfig::default())?;
//!     let mut router = warehouse.router(RouterConfig::default());
//!     let connection = router.connection()?;
//!     connection.execute_batch("SELECT 1")?;
//!     Ok(())
//! }
//! ```

mod duckdb;
mod migrations;
mod query;
mod router;
mod tables;
mod writer;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::Connection;
use thiserror::Error;

pub use crate::duckdb::{open_connection, DuckDbConnectionFactory};
pub use crate::query::{lookup, QueryResult, SqlColumn, DEFAULT_MAX_ROWS};
pub use crate::router::{
    ConnectionFactory, ConnectionRouter, ConnectionState, LiveConnection, RouterConfig,
};
pub use crate::tables::{table_def, TableDef, TABLES};
pub use crate::writer::{try_write_batch, write_batch, TableBatch, WriteMode};
pub use ::duckdb::types::Value as DuckValue;

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Statement was rejected before reaching the database.
    #[error("query rejected: {0}")]
    QueryRejected(String),

    /// The router gave up reconnecting after reaching its configured ceiling.
    #[error("storage connection lost after {attempts} reconnect attempts")]
    ConnectionLost { attempts: u32 },
}

/// Location of the warehouse on disk.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for twstock data.
    pub twstock_home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        let twstock_home = resolve_twstock_home();
        let db_path = match env::var_os("TWSTOCK_DB_PATH") {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => twstock_home.join("warehouse.duckdb"),
        };
        Self {
            twstock_home,
            db_path,
        }
    }
}

impl WarehouseConfig {
    /// Keep the resolved home directory but point at a specific database file.
    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }
}

/// Handle on an initialized warehouse file.
///
/// Opening a `Warehouse` applies migrations and releases its connection again;
/// runs obtain their connection through [`Warehouse::router`].
#[derive(Debug, Clone)]
pub struct Warehouse {
    config: WarehouseConfig,
    factory: DuckDbConnectionFactory,
}

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open a warehouse with the specified configuration.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let factory = DuckDbConnectionFactory::new(config.db_path.clone());
        let warehouse = Self { config, factory };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Create the destination tables if they do not exist yet.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = open_connection(self.db_path())?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    /// Get the path to the database file.
    pub fn db_path(&self) -> &Path {
        self.config.db_path.as_path()
    }

    /// Home directory this warehouse was resolved from.
    pub fn home(&self) -> &Path {
        self.config.twstock_home.as_path()
    }

    /// Build the connection router that a pipeline run writes through.
    pub fn router(&self, config: RouterConfig) -> ConnectionRouter<DuckDbConnectionFactory> {
        ConnectionRouter::new(self.factory.clone(), config)
    }

    /// Read rows of one destination table for an identifier and date range.
    pub fn lookup(
        &self,
        table: &str,
        id: &str,
        start: Option<&str>,
        end: Option<&str>,
        max_rows: usize,
    ) -> Result<QueryResult, WarehouseError> {
        let connection = open_connection(self.db_path())?;
        lookup(&connection, table, id, start, end, max_rows)
    }
}

/// Finalize a transaction, committing on success or rolling back on failure.
pub(crate) fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

/// Quote a column or table identifier, rejecting names that would need escaping.
pub(crate) fn quote_identifier(name: &str) -> Result<String, WarehouseError> {
    if name.is_empty() || name.contains('"') || name.contains('\0') {
        return Err(WarehouseError::QueryRejected(format!(
            "invalid identifier '{name}'"
        )));
    }
    Ok(format!("\"{name}\""))
}

/// Resolve the twstock home directory from environment or default.
fn resolve_twstock_home() -> PathBuf {
    if let Some(path) = env::var_os("TWSTOCK_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".twstock");
    }

    PathBuf::from(".twstock")
}
