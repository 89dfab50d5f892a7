// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Every date strategy was tried and none accepted the literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparseable date value {value:?}")]
pub struct DateParseError {
    pub value: String,
}

/// Failures of the persisted collection.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O on `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("glob: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("store connection is closed")]
    Closed,

    #[error("invalid stored record: {0}")]
    InvalidRecord(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Fatal conditions of an ingestion run. Nothing here is retried.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("source directory `{path}` is not readable: {source}")]
    SourceDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration: {0}")]
    Config(String),

    #[error("CSV decode error in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("{file} row {row}: unparseable Created value {value:?}")]
    Date {
        file: String,
        row: usize,
        value: String,
    },

    #[error("store error{}: {source}", .file.as_ref().map(|f| format!(" while loading {f}")).unwrap_or_default())]
    Store {
        file: Option<String>,
        #[source]
        source: StoreError,
    },

    #[error("worker task failed: {0}")]
    Task(String),
}

impl From<StoreError> for IngestError {
    fn from(source: StoreError) -> Self {
        IngestError::Store { file: None, source }
    }
}
