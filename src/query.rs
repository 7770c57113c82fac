// src/query.rs

use rusqlite::{types::Value as SqlValue, Connection};
use std::{fmt, io::Write};

use crate::error::{EtlError, Result};
use crate::table::format_float;

/// Rows returned by one query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub query: String,
    pub rows: Vec<Vec<SqlValue>>,
}

impl fmt::Display for QueryResult {
    /// One line per row, values joined by `|`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            let line = row.iter().map(render).collect::<Vec<_>>().join(" | ");
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

fn render(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Integer(n) => n.to_string(),
        SqlValue::Real(v) => format_float(*v),
        SqlValue::Text(s) => s.clone(),
        SqlValue::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

/// Run `query` and fetch every row.
pub fn execute(conn: &Connection, query: &str) -> Result<QueryResult> {
    let err = |e: rusqlite::Error| EtlError::query(query, e);
    let mut stmt = conn.prepare(query).map_err(err)?;
    let width = stmt.column_count();
    let rows = stmt
        .query_map([], |row| -> rusqlite::Result<Vec<SqlValue>> {
            (0..width).map(|i| row.get::<_, SqlValue>(i)).collect()
        })
        .map_err(err)?
        .collect::<rusqlite::Result<Vec<Vec<SqlValue>>>>()
        .map_err(err)?;
    Ok(QueryResult {
        query: query.to_string(),
        rows,
    })
}

/// Execute `queries` in order, printing each query, its rows and a blank
/// line to `out`. Stops at the first failing query.
pub fn run_queries<Q, W>(conn: &Connection, queries: &[Q], out: &mut W) -> Result<Vec<QueryResult>>
where
    Q: AsRef<str>,
    W: Write,
{
    let io_err = |e: std::io::Error| EtlError::output("console", e);
    let mut results = Vec::with_capacity(queries.len());
    for query in queries {
        let query = query.as_ref();
        writeln!(out, "Executing query: {}", query).map_err(io_err)?;
        let result = execute(conn, query)?;
        write!(out, "{}", result).map_err(io_err)?;
        writeln!(out).map_err(io_err)?;
        results.push(result);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(values: &[f64]) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE Largest_banks (Rank INTEGER, Name TEXT, MC_USD_Billion REAL)",
            [],
        )
        .unwrap();
        for (i, v) in values.iter().enumerate() {
            conn.execute(
                "INSERT INTO Largest_banks VALUES (?1, ?2, ?3)",
                rusqlite::params![i as i64 + 1, format!("Bank {}", i + 1), v],
            )
            .unwrap();
        }
        conn
    }

    #[test]
    fn test_average() {
        let conn = store_with(&[100.0, 200.0]);
        let res = execute(&conn, "SELECT AVG(MC_USD_Billion) FROM Largest_banks").unwrap();
        assert_eq!(res.rows, vec![vec![SqlValue::Real(150.0)]]);
        assert_eq!(res.to_string(), "150.0\n");
    }

    #[test]
    fn test_run_queries_output() {
        let conn = store_with(&[100.0, 200.0]);
        let queries = [
            "SELECT Rank, Name FROM Largest_banks",
            "SELECT Name FROM Largest_banks LIMIT 1",
        ];
        let mut out = Vec::new();
        let results = run_queries(&conn, &queries, &mut out).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].query, "SELECT Name FROM Largest_banks LIMIT 1");
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Executing query: SELECT Rank, Name FROM Largest_banks\n\
             1 | Bank 1\n\
             2 | Bank 2\n\
             \n\
             Executing query: SELECT Name FROM Largest_banks LIMIT 1\n\
             Bank 1\n\
             \n"
        );
    }

    #[test]
    fn test_failure_stops_batch() {
        let conn = store_with(&[1.0]);
        let queries = [
            "SELECT COUNT(*) FROM Largest_banks",
            "SELECT * FROM missing_table",
            "SELECT Name FROM Largest_banks",
        ];
        let mut out = Vec::new();
        let err = run_queries(&conn, &queries, &mut out).unwrap_err();
        match err {
            EtlError::Query { query, .. } => assert_eq!(query, "SELECT * FROM missing_table"),
            other => panic!("expected query error, got {:?}", other),
        }
        let printed = String::from_utf8(out).unwrap();
        assert!(!printed.contains("SELECT Name FROM Largest_banks"));
    }
}
