// src/discover/mod.rs
pub mod snapshot;

use chrono::{DateTime, Utc};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::process::date_parser::midnight_utc;
use snapshot::extract_date_from_filename;

/// Extension (case-insensitive) of the files that make up a corpus.
pub const SOURCE_EXTENSION: &str = "csv";

/// Where a file's snapshot date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOrigin {
    /// A `YYYY-MM-DD` in the file name.
    FileName,
    /// The file's last-modified time.
    ModifiedTime,
}

/// One snapshot file of the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub snapshot_date: DateTime<Utc>,
    pub origin: SnapshotOrigin,
}

impl SourceFile {
    pub fn file_name(&self) -> String {
        lossy_file_name(&self.path).unwrap_or_else(|| self.path.display().to_string())
    }
}

fn lossy_file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(SOURCE_EXTENSION))
        .unwrap_or(false)
}

/// List `dir` and return its CSV files, in directory-listing order, each
/// tagged with a snapshot date.
///
/// An unreadable directory is fatal. Other entries are skipped silently.
pub fn discover_sources(dir: &Path) -> Result<Vec<SourceFile>, IngestError> {
    let source_dir = |source| IngestError::SourceDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut all = Vec::new();
    for entry in fs::read_dir(dir).map_err(source_dir)? {
        all.push(entry.map_err(source_dir)?.path());
    }
    debug!(files = ?all, "directory listing");

    let mut out = Vec::new();
    for path in all {
        if !path.is_file() || !has_source_extension(&path) {
            continue;
        }
        out.push(snapshot_for(path)?);
    }
    info!(count = out.len(), dir = %dir.display(), "found CSV files");
    Ok(out)
}

/// Date from the file name, else the modification time (with a warning).
pub fn snapshot_for(path: PathBuf) -> Result<SourceFile, IngestError> {
    let name = lossy_file_name(&path).unwrap_or_default();

    if let Some(date) = extract_date_from_filename(&name) {
        return Ok(SourceFile {
            path,
            snapshot_date: midnight_utc(date),
            origin: SnapshotOrigin::FileName,
        });
    }

    let modified = fs::metadata(&path)
        .and_then(|m| m.modified())
        .map_err(|source| IngestError::SourceDir {
            path: path.clone(),
            source,
        })?;
    let snapshot_date = DateTime::<Utc>::from(modified);
    warn!(
        file = %name,
        snapshot_date = %snapshot_date.to_rfc3339(),
        "could not parse date from filename; using file modification time as SnapshotDate"
    );
    Ok(SourceFile {
        path,
        snapshot_date,
        origin: SnapshotOrigin::ModifiedTime,
    })
}
