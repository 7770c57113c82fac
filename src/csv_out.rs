// src/csv_out.rs

use std::{fs, path::Path};

use crate::error::{EtlError, Result};
use crate::table::Table;

/// Write `table` with a header row and no index column, replacing any file at `path`.
pub fn write_csv(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let target = path.display().to_string();
    let err = |e: &dyn std::fmt::Display| EtlError::output(&target, e);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| err(&e))?;
    }

    let mut wtr = csv::Writer::from_path(path).map_err(|e| err(&e))?;
    wtr.write_record(table.columns()).map_err(|e| err(&e))?;
    for row in table.rows() {
        wtr.write_record(row.iter().map(|v| v.to_string()))
            .map_err(|e| err(&e))?;
    }
    wtr.flush().map_err(|e| err(&e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;
    use tempfile::tempdir;

    #[test]
    fn test_write_csv_overwrites() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("out").join("bank_data.csv");

        let mut t = Table::new(vec!["Rank".into(), "Name".into(), "Market Cap".into()]);
        t.push_row(vec![
            Value::Text("1".into()),
            Value::Text("Bank A, plc".into()),
            Value::Float(500.0),
        ])
        .unwrap();
        write_csv(&t, &path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Rank,Name,Market Cap\n1,\"Bank A, plc\",500.0\n"
        );

        write_csv(&t.head(0), &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Rank,Name,Market Cap\n");
    }
}
