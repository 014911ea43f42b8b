//! Transactional batch loads into the destination tables.

use ::duckdb::types::Value as DuckValue;
use ::duckdb::{Connection, ToSql};
use tracing::{info, warn};

use crate::router::{ConnectionFactory, ConnectionRouter};
use crate::tables::{table_def, TableDef};
use crate::{finalize_transaction, quote_identifier, WarehouseError};

/// Rows bound per INSERT statement. All chunks of a batch share one transaction.
const ROWS_PER_STATEMENT: usize = 500;

/// How a batch treats rows whose key already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Plain insert. A duplicate key fails the whole batch.
    Append,
    /// Insert, or rewrite the table's mutable columns on key conflict.
    Upsert,
}

impl WriteMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Upsert => "upsert",
        }
    }
}

/// A fully validated batch destined for one table.
#[derive(Debug, Clone)]
pub struct TableBatch<'a> {
    pub table: &'a str,
    pub columns: &'a [&'a str],
    pub rows: Vec<Vec<DuckValue>>,
}

/// Write a batch and report success as a boolean.
///
/// Storage errors never escape: they roll the transaction back and are logged.
pub fn write_batch(connection: &Connection, batch: &TableBatch<'_>, mode: WriteMode) -> bool {
    match try_write_batch(connection, batch, mode) {
        Ok(written) => {
            info!(
                table = batch.table,
                mode = mode.as_str(),
                rows = written,
                "batch committed"
            );
            true
        }
        Err(error) => {
            warn!(
                table = batch.table,
                mode = mode.as_str(),
                rows = batch.rows.len(),
                %error,
                "batch rolled back"
            );
            false
        }
    }
}

impl<F> ConnectionRouter<F>
where
    F: ConnectionFactory<Connection = Connection>,
{
    /// Write through a liveness-checked connection.
    ///
    /// Only connection loss (with a reconnect ceiling) is an error; storage
    /// failures come back as `Ok(false)`.
    pub fn write_batch(
        &mut self,
        batch: &TableBatch<'_>,
        mode: WriteMode,
    ) -> Result<bool, WarehouseError> {
        let connection = self.connection()?;
        Ok(write_batch(connection, batch, mode))
    }
}

/// Write a batch inside a single transaction, returning the number of affected rows.
///
/// # Security
/// The table name must be one of the known destination tables and every value
/// is bound as a statement parameter.
pub fn try_write_batch(
    connection: &Connection,
    batch: &TableBatch<'_>,
    mode: WriteMode,
) -> Result<usize, WarehouseError> {
    let table = table_def(batch.table).ok_or_else(|| {
        WarehouseError::QueryRejected(format!("unknown destination table '{}'", batch.table))
    })?;

    if batch.columns.is_empty() {
        return Err(WarehouseError::QueryRejected(String::from(
            "batch must name at least one column",
        )));
    }
    if let Some(index) = batch
        .rows
        .iter()
        .position(|row| row.len() != batch.columns.len())
    {
        return Err(WarehouseError::QueryRejected(format!(
            "row {index} has {} values for {} columns",
            batch.rows[index].len(),
            batch.columns.len()
        )));
    }
    if batch.rows.is_empty() {
        return Ok(0);
    }

    let column_list = batch
        .columns
        .iter()
        .map(|column| quote_identifier(column))
        .collect::<Result<Vec<_>, _>>()?
        .join(", ");
    let conflict_clause = match mode {
        WriteMode::Append => String::new(),
        WriteMode::Upsert => upsert_clause(table, batch.columns)?,
    };
    let row_placeholder = format!("({})", vec!["?"; batch.columns.len()].join(", "));

    connection.execute_batch("BEGIN TRANSACTION")?;
    let result = (|| -> Result<usize, WarehouseError> {
        let mut written = 0;
        for chunk in batch.rows.chunks(ROWS_PER_STATEMENT) {
            let placeholders = vec![row_placeholder.as_str(); chunk.len()].join(", ");
            // Table name comes from the known-table list above.
            let sql = format!(
                "INSERT INTO {table} ({column_list}) VALUES {placeholders}{conflict_clause}",
                table = table.name
            );
            let params: Vec<&dyn ToSql> = chunk
                .iter()
                .flatten()
                .map(|value| value as &dyn ToSql)
                .collect();
            written += connection.execute(sql.as_str(), params.as_slice())?;
        }
        Ok(written)
    })();

    finalize_transaction(connection, result)
}

fn upsert_clause(table: &TableDef, columns: &[&str]) -> Result<String, WarehouseError> {
    if table.mutable_columns.is_empty() {
        return Err(WarehouseError::QueryRejected(format!(
            "table '{}' does not accept upserts",
            table.name
        )));
    }
    for required in table.key_columns.iter().chain(table.mutable_columns) {
        if !columns.contains(required) {
            return Err(WarehouseError::QueryRejected(format!(
                "upsert into '{}' requires column '{required}'",
                table.name
            )));
        }
    }

    let keys = table
        .key_columns
        .iter()
        .map(|column| quote_identifier(column))
        .collect::<Result<Vec<_>, _>>()?
        .join(", ");
    let assignments = table
        .mutable_columns
        .iter()
        .map(|column| quote_identifier(column).map(|quoted| format!("{quoted} = EXCLUDED.{quoted}")))
        .collect::<Result<Vec<_>, _>>()?
        .join(", ");

    Ok(format!(" ON CONFLICT ({keys}) DO UPDATE SET {assignments}"))
}
