// src/store.rs

use rusqlite::{params_from_iter, types::Value as SqlValue, Connection};
use std::path::Path;
use tracing::{debug, instrument};

use crate::error::{EtlError, Result};
use crate::extract::{NAME, RANK};
use crate::table::{Table, Value};

/// Open (or create) the SQLite store at `path`.
pub fn open(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    Connection::open(path)
        .map_err(|e| EtlError::Store(format!("opening {}: {}", path.display(), e)))
}

/// Relation/column names may not contain spaces.
pub fn normalize_column_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// Declared SQL type of a normalized column.
pub fn sql_type(column: &str) -> &'static str {
    match column {
        RANK => "INTEGER",
        NAME => "TEXT",
        _ => "REAL",
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_sql(value: &Value, sql_type: &str) -> SqlValue {
    match (value, sql_type) {
        (Value::Float(v), _) => SqlValue::Real(*v),
        (Value::Text(s), "INTEGER") => match s.parse::<i64>() {
            Ok(n) => SqlValue::Integer(n),
            Err(_) => SqlValue::Text(s.clone()),
        },
        (Value::Text(s), "REAL") => match s.parse::<f64>() {
            Ok(n) => SqlValue::Real(n),
            Err(_) => SqlValue::Text(s.clone()),
        },
        (Value::Text(s), _) => SqlValue::Text(s.clone()),
    }
}

/// Drop and recreate `relation` from `table`.
///
/// Drop, create and insert run in one transaction; on failure the
/// previous contents are kept. Returns the number of rows written.
#[instrument(level = "debug", skip(conn, table), fields(rows = table.num_rows()))]
pub fn load_table(conn: &mut Connection, relation: &str, table: &Table) -> Result<usize> {
    let columns: Vec<String> = table
        .columns()
        .iter()
        .map(|c| normalize_column_name(c))
        .collect();
    let relation = normalize_column_name(relation);

    let types: Vec<&'static str> = columns.iter().map(|c| sql_type(c)).collect();
    let column_defs = columns
        .iter()
        .zip(&types)
        .map(|(c, t)| format!("{} {}", quote_ident(c), t))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; types.len()].join(", ");

    let tx = conn.transaction()?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {rel}; CREATE TABLE {rel} ({column_defs});",
        rel = quote_ident(&relation),
    ))?;
    {
        let mut insert = tx.prepare(&format!(
            "INSERT INTO {} VALUES ({})",
            quote_ident(&relation),
            placeholders
        ))?;
        for row in table.rows() {
            insert.execute(params_from_iter(
                row.iter().zip(&types).map(|(v, t)| to_sql(v, t)),
            ))?;
        }
    }
    tx.commit()?;

    debug!(relation = %relation, columns = ?columns, "relation replaced");
    Ok(table.num_rows())
}
