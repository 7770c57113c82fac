use anyhow::Result;
use banks_etl::{pipeline, progress::ProgressLog, Config, Outcome};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stdout)
        .init();
    info!("startup");

    // ─── 2) configure ────────────────────────────────────────────────
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("config: {:#}", e);
            return Ok(());
        }
    };

    // ─── 3) run; handled stage failures still exit 0 ─────────────────
    match pipeline::run(&config) {
        Ok(Outcome::Completed) => info!("all done"),
        Ok(outcome) => info!(?outcome, "finished early"),
        Err(e) => {
            // run() has already closed the store
            ProgressLog::new(&config.log_path).error(format!("Error: {:#}", e));
        }
    }
    Ok(())
}
