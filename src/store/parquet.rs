// src/store/parquet.rs

use chrono::Utc;
use glob::{glob, Pattern};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    fs::{self, File},
    io::{BufWriter, ErrorKind},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use super::arrow::{batch_to_records, records_to_batch};
use super::TicketStore;
use crate::error::StoreError;
use crate::process::record::TicketRecord;

/// Collection stored as a directory of Parquet parts:
/// `<root>/<database>/<collection>/part-<seq>-<micros>.parquet`.
///
/// Each `insert_many` lands as one part, written to a `.tmp` file and renamed
/// into place, so readers never see half a batch.
pub struct ParquetStore {
    db_dir: PathBuf,
    collection: String,
    next_seq: usize,
    open: bool,
}

impl ParquetStore {
    /// Open (creating if needed) `<root>/<database>`.
    pub fn connect(
        root: impl AsRef<Path>,
        database: &str,
        collection: &str,
    ) -> Result<Self, StoreError> {
        let db_dir = root.as_ref().join(database);
        fs::create_dir_all(&db_dir).map_err(|e| StoreError::io(&db_dir, e))?;

        let mut store = Self {
            db_dir,
            collection: collection.to_string(),
            next_seq: 0,
            open: true,
        };
        store.next_seq = store.parts()?.len();
        info!(db = %store.db_dir.display(), collection, "connected to store");
        Ok(store)
    }

    pub fn collection_dir(&self) -> PathBuf {
        self.db_dir.join(&self.collection)
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.open {
            Ok(())
        } else {
            Err(StoreError::Closed)
        }
    }

    /// Committed parts, oldest first.
    fn parts(&self) -> Result<Vec<PathBuf>, StoreError> {
        let dir = Pattern::escape(&self.collection_dir().to_string_lossy());
        let pattern = format!("{}/part-*.parquet", dir);
        let mut parts: Vec<PathBuf> = glob(&pattern)?.filter_map(Result::ok).collect();
        parts.sort();
        Ok(parts)
    }

    fn open_part(path: &Path) -> Result<ParquetRecordBatchReaderBuilder<File>, StoreError> {
        let file = File::open(path).map_err(|e| StoreError::io(path, e))?;
        Ok(ParquetRecordBatchReaderBuilder::try_new(file)?)
    }
}

impl TicketStore for ParquetStore {
    fn drop_collection(&mut self) -> Result<bool, StoreError> {
        self.ensure_open()?;
        let dir = self.collection_dir();
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                self.next_seq = 0;
                info!(collection = %self.collection, "dropped existing collection");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.next_seq = 0;
                debug!(collection = %self.collection, "collection absent; nothing to drop");
                Ok(false)
            }
            Err(e) => Err(StoreError::io(dir, e)),
        }
    }

    fn insert_many(&mut self, records: &[TicketRecord]) -> Result<usize, StoreError> {
        self.ensure_open()?;
        if records.is_empty() {
            return Ok(0);
        }

        let dir = self.collection_dir();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let batch = records_to_batch(records)?;
        let fname = format!(
            "part-{:06}-{}.parquet",
            self.next_seq,
            Utc::now().timestamp_micros()
        );
        let tmp = dir.join(format!("{}.tmp", fname));
        let final_path = dir.join(&fname);

        let file = File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let mut writer = ArrowWriter::try_new(BufWriter::new(file), batch.schema(), Some(props))?;
        writer.write(&batch)?;
        writer.close()?;
        fs::rename(&tmp, &final_path).map_err(|e| StoreError::io(&final_path, e))?;

        self.next_seq += 1;
        debug!(part = %fname, rows = records.len(), "wrote part");
        Ok(records.len())
    }

    fn load_all(&self) -> Result<Vec<TicketRecord>, StoreError> {
        self.ensure_open()?;
        let mut out = Vec::new();
        for path in self.parts()? {
            let mut reader = Self::open_part(&path)?.with_batch_size(1024).build()?;
            while let Some(batch) = reader.next().transpose()? {
                out.extend(batch_to_records(&batch)?);
            }
        }
        Ok(out)
    }

    fn count(&self) -> Result<usize, StoreError> {
        self.ensure_open()?;
        let mut total = 0usize;
        for path in self.parts()? {
            let rows = Self::open_part(&path)?.metadata().file_metadata().num_rows();
            total += usize::try_from(rows).unwrap_or(0);
        }
        Ok(total)
    }

    fn close(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.open = false;
        info!(db = %self.db_dir.display(), "store connection closed");
        Ok(())
    }
}
