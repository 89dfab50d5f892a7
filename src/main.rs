use anyhow::{Context, Result};
use ticketload::{init_logging, pipeline, Config};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    init_logging();
    info!("startup");

    // ─── 2) configuration ────────────────────────────────────────────
    let config = Config::load().context("loading configuration")?;
    let cwd = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    info!(source_dir = %config.source_dir.display(), cwd = %cwd, "corpus path");

    // ─── 3) drop, discover, parse, load ──────────────────────────────
    match pipeline::run_migration(&config).await {
        Ok(report) => {
            for f in &report.files {
                info!(file = %f.file, rows = f.rows, origin = ?f.origin, "loaded");
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "migration failed");
            Err(e).context("ticket migration")
        }
    }
}
