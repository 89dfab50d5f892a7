//! check_store: print how many tickets the store holds plus a few random samples.

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use ticketload::{
    init_logging,
    process::record::format_timestamp,
    store::{ParquetStore, TicketStore},
    Config,
};
use tracing::{info, warn};

const SAMPLE_SIZE: usize = 5;

fn main() -> Result<()> {
    init_logging();

    let config = Config::load().context("loading configuration")?;
    info!("connecting to store");
    let mut store = ParquetStore::connect(&config.store_uri, &config.database, &config.collection)
        .context("connecting to store")?;

    let result = report(&store);
    if let Err(e) = store.close() {
        warn!(error = %e, "closing store");
    }
    result
}

fn report(store: &ParquetStore) -> Result<()> {
    let total = store.count().context("counting tickets")?;
    if total == 0 {
        println!("The \"{}\" collection is empty.", store.collection_dir().display());
        return Ok(());
    }

    let records = store.load_all().context("loading tickets")?;
    let mut rng = rand::thread_rng();
    let sample: Vec<_> = records.choose_multiple(&mut rng, SAMPLE_SIZE).collect();

    println!(
        "Found {} total tickets. Showing up to {} random samples:",
        total, SAMPLE_SIZE
    );
    println!("---------------------------------");
    for rec in sample {
        println!("Ticket:       {}", rec.ticket());
        println!("Status:       {}", rec.status());
        println!(
            "Created:      {}",
            rec.created.map(format_timestamp).unwrap_or_else(|| "null".into())
        );
        println!("SnapshotDate: {}", format_timestamp(rec.snapshot_date));
        println!("---------------------------------");
    }
    Ok(())
}
