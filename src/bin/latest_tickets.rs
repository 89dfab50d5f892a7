//! latest_tickets: one JSON line per ticket, its most recent snapshot.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufWriter, Write};
use ticketload::{
    init_logging,
    query::{query_latest, SortOrder, SortSpec, TicketFilter},
    store::{ParquetStore, TicketStore},
    Config,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about = "Latest snapshot of every ticket, optionally filtered")]
struct Args {
    /// Keep tickets whose latest Status is one of these (repeatable)
    #[arg(long)]
    status: Vec<String>,
    /// Keep tickets whose latest Priority is one of these (repeatable)
    #[arg(long)]
    priority: Vec<String>,
    /// Column to sort by, e.g. Created, Status, Ticket
    #[arg(long)]
    sort_by: Option<String>,
    #[arg(long, default_value = "asc")]
    order: SortOrder,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config = Config::load().context("loading configuration")?;
    let mut store = ParquetStore::connect(&config.store_uri, &config.database, &config.collection)
        .context("connecting to store")?;
    let loaded = store.load_all().context("loading tickets");
    if let Err(e) = store.close() {
        warn!(error = %e, "closing store");
    }

    let filter = TicketFilter {
        status: args.status,
        priority: args.priority,
    };
    let sort = args.sort_by.map(|field| SortSpec {
        field,
        order: args.order,
    });
    let tickets = query_latest(loaded?, &filter, sort.as_ref());
    info!(count = tickets.len(), "found tickets");

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for t in &tickets {
        serde_json::to_writer(&mut out, &t.to_json())?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
