//! `DuckDB` connections for the router.

use std::path::{Path, PathBuf};

use ::duckdb::Connection;

use crate::router::{ConnectionFactory, LiveConnection};
use crate::WarehouseError;

/// Liveness probe issued before every routed access.
const PROBE_SQL: &str = "SELECT 1 + 1";

/// Opens connections to one `DuckDB` file.
#[derive(Debug, Clone)]
pub struct DuckDbConnectionFactory {
    db_path: PathBuf,
}

impl DuckDbConnectionFactory {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: path.into(),
        }
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.db_path.as_path()
    }
}

impl ConnectionFactory for DuckDbConnectionFactory {
    type Connection = Connection;

    fn connect(&self) -> Result<Connection, WarehouseError> {
        open_connection(self.db_path.as_path())
    }

    fn describe(&self) -> String {
        self.db_path.display().to_string()
    }
}

impl LiveConnection for Connection {
    fn probe(&self) -> Result<(), WarehouseError> {
        let value: i64 = self.query_row(PROBE_SQL, [], |row| row.get(0))?;
        if value == 2 {
            Ok(())
        } else {
            Err(WarehouseError::QueryRejected(format!(
                "liveness probe returned {value}"
            )))
        }
    }

    fn close(self) -> Result<(), WarehouseError> {
        Connection::close(self).map_err(|(_, error)| WarehouseError::DuckDb(error))
    }
}

/// Open a new database connection.
///
/// # Errors
/// Returns an error if the database file cannot be opened or configured.
pub fn open_connection(path: &Path) -> Result<Connection, WarehouseError> {
    let connection = Connection::open(path)?;
    configure_connection(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")
}
