// src/process/mod.rs
pub mod date_parser;
pub mod reader;
pub mod record;

use std::io::Read;
use tracing::debug;

use crate::discover::SourceFile;
use crate::error::IngestError;
use date_parser::normalize_date;
use reader::RecordReader;
use record::{TicketRecord, CREATED};

/// Read every row of `source`, normalize `Created`, and stamp the file's
/// snapshot date on each one.
///
/// The first `Created` value that no strategy accepts aborts the file.
#[tracing::instrument(level = "info", skip(source), fields(file = %source.file_name()))]
pub fn load_ticket_file(source: &SourceFile) -> Result<Vec<TicketRecord>, IngestError> {
    let file = source.file_name();
    let rows = RecordReader::open(&source.path).map_err(|e| IngestError::Csv {
        file: file.clone(),
        source: e,
    })?;
    collect_tickets(rows, &file, source)
}

/// Same as [`load_ticket_file`] over an already-open reader.
pub fn collect_tickets<R: Read>(
    rows: RecordReader<R>,
    file: &str,
    source: &SourceFile,
) -> Result<Vec<TicketRecord>, IngestError> {
    let mut out = Vec::new();
    for (idx, row) in rows.enumerate() {
        let row = row.map_err(|e| IngestError::Csv {
            file: file.to_string(),
            source: e,
        })?;
        let created =
            normalize_date(row.get(CREATED).map(String::as_str)).map_err(|e| {
                IngestError::Date {
                    file: file.to_string(),
                    row: idx + 1,
                    value: e.value,
                }
            })?;
        out.push(TicketRecord::from_raw(row, created, source.snapshot_date));
    }
    debug!(rows = out.len(), "parsed rows");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discover::SnapshotOrigin;
    use chrono::{TimeZone, Utc};
    use std::{fs, path::PathBuf};
    use tempfile::tempdir;

    fn source(path: PathBuf) -> SourceFile {
        SourceFile {
            path,
            snapshot_date: Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap(),
            origin: SnapshotOrigin::FileName,
        }
    }

    #[test]
    fn rows_get_created_and_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot-2024-01-05.csv");
        fs::write(
            &path,
            "Ticket,Status,Priority,Created,Description\n\
             T-1,Open,High,31-Dec-23,printer on fire\n\
             T-2,Closed,Low,nan,\n\
             T-3,Open,Low,,\n",
        )
        .unwrap();

        let recs = load_ticket_file(&source(path)).unwrap();
        assert_eq!(recs.len(), 3);
        assert_eq!(
            recs[0].created,
            Some(Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap())
        );
        assert_eq!(recs[0].fields["Description"], "printer on fire");
        assert_eq!(recs[1].created, None);
        assert_eq!(recs[2].created, None);
        assert!(recs
            .iter()
            .all(|r| r.snapshot_date == Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()));
    }

    #[test]
    fn unparseable_created_names_file_row_and_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(
            &path,
            "Ticket,Status,Priority,Created\nT-1,Open,High,2023-12-31\nT-2,Open,High,not-a-date\n",
        )
        .unwrap();

        match load_ticket_file(&source(path)) {
            Err(IngestError::Date { file, row, value }) => {
                assert_eq!(file, "bad.csv");
                assert_eq!(row, 2);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("expected date error, got {:?}", other),
        }
    }

    #[test]
    fn file_without_rows_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "Ticket,Status,Priority,Created\n").unwrap();
        assert!(load_ticket_file(&source(path)).unwrap().is_empty());
    }
}
