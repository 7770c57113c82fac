use anyhow::{bail, Result};
use banks_etl::{progress::ProgressLog, query, store, Config};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stdout)
        .init();

    // 1. Configuration
    let config = Config::load()?;
    let log = ProgressLog::new(&config.log_path);

    // 2. Query an existing store only; never create an empty one
    if !config.db_path.exists() {
        bail!("no store at {}; run banks_etl first", config.db_path.display());
    }
    let conn = store::open(&config.db_path)?;

    // 3. Run the fixed batch
    let stdout = std::io::stdout();
    match query::run_queries(&conn, &config.queries(), &mut stdout.lock()) {
        Ok(_) => log.info("Executed all queries successfully."),
        Err(e) => log.error(format!("Error executing query: {}", e)),
    }

    if let Err((_, e)) = conn.close() {
        log.error(format!("Error closing database: {}", e));
    }
    Ok(())
}
