// src/store/arrow.rs

use arrow::{
    array::{Array, ArrayRef, StringArray, TimestampMicrosecondArray},
    datatypes::{DataType, Field, Schema as ArrowSchema, TimeUnit},
    record_batch::RecordBatch,
};
use chrono::{DateTime, Utc};
use std::{collections::BTreeSet, sync::Arc};

use crate::error::StoreError;
use crate::process::record::{TicketRecord, CREATED, SNAPSHOT_DATE};

/// Timestamps are stored as µs since the epoch, tagged UTC.
pub fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, Some(Arc::from("UTC")))
}

/// Schema for a batch with the given open-schema columns.
///
/// - every open column → nullable Utf8, in the given order
/// - `Created`        → nullable Timestamp(µs, UTC)
/// - `SnapshotDate`   → non-null Timestamp(µs, UTC)
pub fn build_ticket_schema<'a, I>(columns: I) -> Arc<ArrowSchema>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut fields: Vec<Field> = columns
        .into_iter()
        .map(|name| Field::new(name, DataType::Utf8, true))
        .collect();
    fields.push(Field::new(CREATED, timestamp_type(), true));
    fields.push(Field::new(SNAPSHOT_DATE, timestamp_type(), false));
    Arc::new(ArrowSchema::new(fields))
}

/// Columnarize `records`. The open columns are the union of every record's
/// field names, sorted; a record missing one gets a null there.
pub fn records_to_batch(records: &[TicketRecord]) -> Result<RecordBatch, StoreError> {
    let columns: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.fields.keys().map(String::as_str))
        .collect();
    let schema = build_ticket_schema(columns.iter().copied());

    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len() + 2);
    for name in &columns {
        let values: Vec<Option<&str>> = records
            .iter()
            .map(|r| r.fields.get(*name).map(String::as_str))
            .collect();
        arrays.push(Arc::new(StringArray::from(values)));
    }

    let created: Vec<Option<i64>> = records
        .iter()
        .map(|r| r.created.map(|c| c.timestamp_micros()))
        .collect();
    arrays.push(Arc::new(
        TimestampMicrosecondArray::from(created).with_timezone("UTC"),
    ));

    let snapshots: Vec<i64> = records
        .iter()
        .map(|r| r.snapshot_date.timestamp_micros())
        .collect();
    arrays.push(Arc::new(
        TimestampMicrosecondArray::from(snapshots).with_timezone("UTC"),
    ));

    Ok(RecordBatch::try_new(schema, arrays)?)
}

fn micros_to_utc(micros: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StoreError::InvalidRecord(format!("timestamp {} out of range", micros)))
}

fn timestamp_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<Option<&'a TimestampMicrosecondArray>, StoreError> {
    let Some(col) = batch.column_by_name(name) else {
        return Ok(None);
    };
    col.as_any()
        .downcast_ref::<TimestampMicrosecondArray>()
        .map(Some)
        .ok_or_else(|| StoreError::InvalidRecord(format!("column {} is not a timestamp", name)))
}

/// Read a stored batch back into records. Null strings are left out of `fields`.
pub fn batch_to_records(batch: &RecordBatch) -> Result<Vec<TicketRecord>, StoreError> {
    let schema = batch.schema();
    let created = timestamp_column(batch, CREATED)?;
    let snapshots = timestamp_column(batch, SNAPSHOT_DATE)?
        .ok_or_else(|| StoreError::InvalidRecord(format!("missing {} column", SNAPSHOT_DATE)))?;

    let strings: Vec<(&str, &StringArray)> = schema
        .fields()
        .iter()
        .zip(batch.columns())
        .filter(|(f, _)| f.name() != CREATED && f.name() != SNAPSHOT_DATE)
        .map(|(f, col)| {
            col.as_any()
                .downcast_ref::<StringArray>()
                .map(|arr| (f.name().as_str(), arr))
                .ok_or_else(|| {
                    StoreError::InvalidRecord(format!("column {} is not Utf8", f.name()))
                })
        })
        .collect::<Result<_, _>>()?;

    let mut out = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        if snapshots.is_null(row) {
            return Err(StoreError::InvalidRecord(format!(
                "row {} has a null {}",
                row, SNAPSHOT_DATE
            )));
        }
        let fields = strings
            .iter()
            .filter(|(_, arr)| !arr.is_null(row))
            .map(|(name, arr)| (name.to_string(), arr.value(row).to_string()))
            .collect();
        let created = match created {
            Some(arr) if !arr.is_null(row) => Some(micros_to_utc(arr.value(row))?),
            _ => None,
        };
        out.push(TicketRecord {
            fields,
            created,
            snapshot_date: micros_to_utc(snapshots.value(row))?,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn record(pairs: &[(&str, &str)], created: Option<DateTime<Utc>>) -> TicketRecord {
        let fields: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TicketRecord {
            fields,
            created,
            snapshot_date: Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn schema_is_union_of_fields_plus_typed_columns() {
        let recs = vec![
            record(&[("Ticket", "T-1"), ("Assigned", "bo")], None),
            record(
                &[("Ticket", "T-2"), ("Organization", "acme")],
                Some(Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap()),
            ),
        ];
        let batch = records_to_batch(&recs).unwrap();
        let names: Vec<_> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(
            names,
            vec!["Assigned", "Organization", "Ticket", "Created", "SnapshotDate"]
        );
        assert_eq!(batch.num_rows(), 2);
        assert!(!batch.schema().field(4).is_nullable());

        // sparse columns come back without the missing keys
        let back = batch_to_records(&batch).unwrap();
        assert_eq!(back, recs);
    }

    #[test]
    fn missing_snapshot_column_is_rejected() {
        let schema = Arc::new(ArrowSchema::new(vec![Field::new(
            "Ticket",
            DataType::Utf8,
            true,
        )]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(StringArray::from(vec![Some("T-1")])) as ArrayRef],
        )
        .unwrap();
        assert!(matches!(
            batch_to_records(&batch),
            Err(StoreError::InvalidRecord(_))
        ));
    }
}
