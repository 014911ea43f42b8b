//! Read-only lookups over the destination tables.

use ::duckdb::types::Value as DuckValue;
use ::duckdb::{Connection, ToSql};
use serde::Serialize;
use serde_json::{Number, Value};

use crate::tables::table_def;
use crate::{quote_identifier, WarehouseError};

/// Row cap applied when the caller has no preference.
pub const DEFAULT_MAX_ROWS: usize = 10_000;

#[derive(Debug, Clone, Serialize)]
pub struct SqlColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: String,
}

/// Rows of one table for one identifier.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub columns: Vec<SqlColumn>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
    /// More than `max_rows` rows matched.
    pub truncated: bool,
}

/// Select rows of `table` for one identifier, optionally bounded by an inclusive ISO date range.
///
/// The identifier column is `FuturesID` for futures and `StockID` elsewhere. Date bounds
/// are ignored for tables without a date column. At most `max_rows` rows come back, oldest first.
pub fn lookup(
    connection: &Connection,
    table: &str,
    id: &str,
    start: Option<&str>,
    end: Option<&str>,
    max_rows: usize,
) -> Result<QueryResult, WarehouseError> {
    if max_rows == 0 {
        return Err(WarehouseError::QueryRejected(String::from(
            "max rows must be greater than zero",
        )));
    }
    let table = table_def(table)
        .ok_or_else(|| WarehouseError::QueryRejected(format!("unknown table '{table}'")))?;

    let mut sql = format!(
        "SELECT * FROM {} WHERE {} = ?",
        table.name,
        quote_identifier(table.id_column)?
    );
    let mut params: Vec<&dyn ToSql> = vec![&id];
    if let Some(date_column) = table.date_column {
        let date_column = quote_identifier(date_column)?;
        if let Some(start) = start.as_ref() {
            sql.push_str(&format!(" AND {date_column} >= ?"));
            params.push(start);
        }
        if let Some(end) = end.as_ref() {
            sql.push_str(&format!(" AND {date_column} <= ?"));
            params.push(end);
        }
        sql.push_str(&format!(" ORDER BY {date_column}"));
    }
    // One extra row tells a full page from a cut one.
    sql.push_str(&format!(" LIMIT {}", max_rows.saturating_add(1)));

    let mut statement = connection.prepare(&sql)?;
    let mut cursor = statement.query(params.as_slice())?;
    let columns = match cursor.as_ref() {
        Some(executed) => executed
            .column_names()
            .into_iter()
            .enumerate()
            .map(|(index, name)| SqlColumn {
                name,
                r#type: executed.column_type(index).to_string(),
            })
            .collect(),
        None => Vec::new(),
    };

    let mut rows = Vec::new();
    while let Some(row) = cursor.next()? {
        let cells = (0..columns.len())
            .map(|index| row.get::<_, DuckValue>(index).map(cell_json))
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(cells);
    }

    let truncated = rows.len() > max_rows;
    rows.truncate(max_rows);
    Ok(QueryResult {
        columns,
        row_count: rows.len(),
        rows,
        truncated,
    })
}

/// Stored cells are TEXT, BIGINT or DOUBLE; non-finite doubles become null.
fn cell_json(value: DuckValue) -> Value {
    match value {
        DuckValue::Text(text) => Value::String(text),
        DuckValue::BigInt(number) => Value::from(number),
        DuckValue::Int(number) => Value::from(number),
        DuckValue::Double(number) => Number::from_f64(number).map_or(Value::Null, Value::Number),
        DuckValue::Null => Value::Null,
        other => Value::String(format!("{other:?}")),
    }
}
