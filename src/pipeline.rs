// src/pipeline.rs
use chrono::{DateTime, Utc};
use std::{fs, path::Path};
use tracing::{info, warn};

use crate::config::Config;
use crate::discover::{discover_sources, SnapshotOrigin, SourceFile};
use crate::error::IngestError;
use crate::process::load_ticket_file;
use crate::store::{ParquetStore, TicketStore};

/// What one source file contributed to the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub file: String,
    pub snapshot_date: DateTime<Utc>,
    pub origin: SnapshotOrigin,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Whether a previous collection was there to drop.
    pub dropped_existing: bool,
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|f| f.rows).sum()
    }
}

/// Connect to the configured store and run a full migration.
pub async fn run_migration(config: &Config) -> Result<RunReport, IngestError> {
    config.validate()?;
    info!(
        source_dir = %config.source_dir.display(),
        store = %config.store_uri.display(),
        database = %config.database,
        collection = %config.collection,
        "starting migration"
    );
    let mut store = ParquetStore::connect(&config.store_uri, &config.database, &config.collection)?;
    run_with_store(&mut store, &config.source_dir).await
}

/// DropExisting → Discover → (Parse → Normalize → Load)* on an open store,
/// then close it whether or not the run succeeded.
pub async fn run_with_store<S: TicketStore>(
    store: &mut S,
    source_dir: &Path,
) -> Result<RunReport, IngestError> {
    let result = ingest(store, source_dir).await;
    let closed = store.close();
    match (result, closed) {
        (Ok(report), Ok(())) => {
            info!(
                files = report.files.len(),
                rows = report.total_rows(),
                "migration completed"
            );
            Ok(report)
        }
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!(error = %close_err, "closing store after failed run");
            Err(e)
        }
    }
}

/// An unreadable corpus is caught before the collection is dropped.
fn check_source_dir(dir: &Path) -> Result<(), IngestError> {
    fs::read_dir(dir)
        .map(|_| ())
        .map_err(|source| IngestError::SourceDir {
            path: dir.to_path_buf(),
            source,
        })
}

async fn ingest<S: TicketStore>(
    store: &mut S,
    source_dir: &Path,
) -> Result<RunReport, IngestError> {
    check_source_dir(source_dir)?;

    let dropped_existing = store.drop_collection()?;
    let sources = discover_sources(source_dir)?;

    let mut report = RunReport {
        dropped_existing,
        files: Vec::with_capacity(sources.len()),
    };
    for source in sources {
        report.files.push(load_one(store, source).await?);
    }
    Ok(report)
}

async fn load_one<S: TicketStore>(
    store: &mut S,
    source: SourceFile,
) -> Result<FileReport, IngestError> {
    let file = source.file_name();
    info!(
        file = %file,
        snapshot_date = %source.snapshot_date.to_rfc3339(),
        "processing"
    );

    // parse off the async thread; one file at a time
    let (source, records) = tokio::task::spawn_blocking(move || {
        let records = load_ticket_file(&source);
        (source, records)
    })
    .await
    .map_err(|e| IngestError::Task(e.to_string()))?;
    let records = records?;

    if !records.is_empty() {
        store
            .insert_many(&records)
            .map_err(|e| IngestError::Store {
                file: Some(file.clone()),
                source: e,
            })?;
        info!(file = %file, rows = records.len(), "inserted documents");
    } else {
        info!(file = %file, "no rows; nothing inserted");
    }

    Ok(FileReport {
        file,
        snapshot_date: source.snapshot_date,
        origin: source.origin,
        rows: records.len(),
    })
}
