// src/pipeline.rs

use anyhow::Result;
use reqwest::blocking::Client;
use rusqlite::Connection;
use std::{io::Write, path::Path};
use tracing::{info, instrument};

use crate::{
    config::Config,
    csv_out,
    error::EtlError,
    extract,
    progress::ProgressLog,
    query, store,
    table::Table,
    transform,
};

/// Rows shown on the console after transformation.
const PREVIEW_ROWS: usize = 5;

/// How far a run got. Handled stage failures are not process errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    ExtractionFailed,
    TransformationFailed,
    /// The store load failed; the query batch still ran against the
    /// relation already in the store.
    LoadFailed,
    QueriesFailed,
}

/// Run the whole pipeline, printing to stdout.
pub fn run(config: &Config) -> Result<Outcome> {
    let client = Client::new();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with(config, &client, &mut out)
}

/// Run the whole pipeline with an explicit HTTP client and console sink.
///
/// The store connection is opened first and closed on every path out of
/// the stages, including unexpected errors.
#[instrument(level = "info", skip_all, fields(source = %config.source_url))]
pub fn run_with<W: Write>(config: &Config, client: &Client, out: &mut W) -> Result<Outcome> {
    let log = ProgressLog::new(&config.log_path);
    let mut conn = store::open(&config.db_path)?;

    let result = run_stages(config, &log, client, &mut conn, out);

    if let Err((_, e)) = conn.close() {
        log.error(format!("Error closing database: {}", e));
    }
    result
}

fn run_stages<W: Write>(
    config: &Config,
    log: &ProgressLog,
    client: &Client,
    conn: &mut Connection,
    out: &mut W,
) -> Result<Outcome> {
    let table = match extract::extract(client, &config.source_url) {
        Ok(table) => {
            log.info(format!("Data extraction complete. {} rows.", table.num_rows()));
            table
        }
        Err(e) => {
            let prefix = match e {
                EtlError::Fetch { .. } => "Error fetching webpage",
                _ => "Error extracting data",
            };
            log.error(format!("{}: {}", prefix, e));
            writeln!(out, "Data extraction failed.")?;
            return Ok(Outcome::ExtractionFailed);
        }
    };

    save_csv(log, &table, &config.raw_csv);

    let table = match transform::transform(table, &config.rate_file) {
        Ok(table) => {
            log.info("Transformation process complete.");
            table
        }
        Err(e) => {
            log.error(format!("Error during transformation: {}", e));
            writeln!(out, "Transformation failed.")?;
            return Ok(Outcome::TransformationFailed);
        }
    };

    write!(out, "{}", table.head(PREVIEW_ROWS))?;
    writeln!(out)?;

    save_csv(log, &table, &config.transformed_csv);

    let relation = config.relation_name();
    let loaded = match store::load_table(conn, &relation, &table) {
        Ok(rows) => {
            log.info(format!(
                "Data loaded to Database as table '{}' ({} rows), Executing queries.",
                relation, rows
            ));
            true
        }
        Err(e) => {
            log.error(format!("Error loading table to DB: {}", e));
            false
        }
    };

    match query::run_queries(conn, &config.queries(), out) {
        Ok(results) => {
            log.info("Executed all queries successfully.");
            info!(queries = results.len(), loaded, "pipeline complete");
            Ok(if loaded {
                Outcome::Completed
            } else {
                Outcome::LoadFailed
            })
        }
        Err(e) => {
            log.error(format!("Error executing query: {}", e));
            Ok(Outcome::QueriesFailed)
        }
    }
}

/// CSV failures are logged and do not stop the run.
fn save_csv(log: &ProgressLog, table: &Table, path: &Path) {
    match csv_out::write_csv(table, path) {
        Ok(()) => log.info(format!("Data saved to CSV file: {}", path.display())),
        Err(e) => log.error(format!("Error saving table to CSV: {}", e)),
    }
}
