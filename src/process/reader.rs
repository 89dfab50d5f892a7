use csv::{ReaderBuilder, StringRecordsIntoIter, Trim};
use std::{fs::File, io::Read, path::Path};

use crate::process::record::RawRow;

/// Lazy, single-pass stream of rows keyed by the header row.
///
/// Decoding is permissive: short rows pad with `""`, cells past the last
/// header are ignored, and rows that are blank after trimming are skipped.
pub struct RecordReader<R> {
    headers: Vec<String>,
    records: StringRecordsIntoIter<R>,
}

impl RecordReader<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, csv::Error> {
        let file = File::open(path)?;
        Self::new(file)
    }
}

impl<R: Read> RecordReader<R> {
    pub fn new(reader: R) -> Result<Self, csv::Error> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| clean_header(i, h))
            .collect();

        Ok(Self {
            headers,
            records: rdr.into_records(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<RawRow, csv::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(r) => r,
                Err(e) => return Some(Err(e)),
            };
            if record.iter().all(str::is_empty) {
                continue;
            }
            let row = self
                .headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").to_string()))
                .collect();
            return Some(Ok(row));
        }
    }
}

/// Trim, and strip a UTF-8 BOM from the first header.
fn clean_header(idx: usize, raw: &str) -> String {
    let h = if idx == 0 {
        raw.trim_start_matches('\u{feff}')
    } else {
        raw
    };
    h.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn rows(csv: &str) -> Vec<RawRow> {
        RecordReader::new(Cursor::new(csv.to_string()))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn header_keys_and_trimmed_values() {
        let got = rows("Ticket , Status,Priority\n T-1 ,Open , High\n");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0]["Ticket"], "T-1");
        assert_eq!(got[0]["Status"], "Open");
        assert_eq!(got[0]["Priority"], "High");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let got = rows("Ticket,Status\n\nT-1,Open\n   \n,\nT-2,Closed\n\n");
        let ids: Vec<_> = got.iter().map(|r| r["Ticket"].as_str()).collect();
        assert_eq!(ids, vec!["T-1", "T-2"]);
    }

    #[test]
    fn ragged_rows_are_tolerated() {
        let got = rows("Ticket,Status,Priority\nT-1,Open\nT-2,Closed,Low,extra\n");
        assert_eq!(got[0]["Priority"], "");
        assert_eq!(got[1]["Priority"], "Low");
        assert_eq!(got[1].len(), 3);
    }

    #[test]
    fn bom_is_stripped_from_first_header() {
        let reader = RecordReader::new(Cursor::new("\u{feff}Ticket,Status\nT-1,Open\n")).unwrap();
        assert_eq!(reader.headers(), &["Ticket".to_string(), "Status".to_string()]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(rows("").is_empty());
        assert!(rows("Ticket,Status\n").is_empty());
    }
}
