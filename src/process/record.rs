use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const TICKET: &str = "Ticket";
pub const STATUS: &str = "Status";
pub const PRIORITY: &str = "Priority";
pub const CREATED: &str = "Created";
pub const SNAPSHOT_DATE: &str = "SnapshotDate";

/// String columns every stored ticket carries.
pub const REQUIRED_FIELDS: [&str; 3] = [TICKET, STATUS, PRIORITY];

/// One row as decoded from a CSV file: header → trimmed cell.
pub type RawRow = BTreeMap<String, String>;

/// A ticket row ready for the store.
///
/// `fields` is open: whatever columns the file had, minus `Created` and
/// `SnapshotDate`, which live in their typed slots. `Ticket`, `Status` and
/// `Priority` are always present, empty when the file lacked them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRecord {
    pub fields: BTreeMap<String, String>,
    pub created: Option<DateTime<Utc>>,
    pub snapshot_date: DateTime<Utc>,
}

impl TicketRecord {
    /// Builds a record from a raw row. Any `Created`/`SnapshotDate` cells are
    /// dropped in favour of the typed values.
    pub fn from_raw(
        mut row: RawRow,
        created: Option<DateTime<Utc>>,
        snapshot_date: DateTime<Utc>,
    ) -> Self {
        row.remove(CREATED);
        row.remove(SNAPSHOT_DATE);
        for key in REQUIRED_FIELDS {
            row.entry(key.to_string()).or_default();
        }
        Self {
            fields: row,
            created,
            snapshot_date,
        }
    }

    pub fn ticket(&self) -> &str {
        self.field(TICKET)
    }

    pub fn status(&self) -> &str {
        self.field(STATUS)
    }

    pub fn priority(&self) -> &str {
        self.field(PRIORITY)
    }

    fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    /// Field lookup by column name, with the typed columns rendered as RFC 3339.
    pub fn get(&self, name: &str) -> Option<String> {
        match name {
            CREATED => self.created.map(format_timestamp),
            SNAPSHOT_DATE => Some(format_timestamp(self.snapshot_date)),
            _ => self.fields.get(name).cloned(),
        }
    }

    /// JSON object in the shape the read API serves.
    pub fn to_json(&self) -> Value {
        let mut obj: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        obj.insert(
            CREATED.to_string(),
            self.created
                .map(|c| Value::String(format_timestamp(c)))
                .unwrap_or(Value::Null),
        );
        obj.insert(
            SNAPSHOT_DATE.to_string(),
            Value::String(format_timestamp(self.snapshot_date)),
        );
        Value::Object(obj)
    }
}

/// `2024-01-05T00:00:00.000Z`
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn typed_columns_replace_raw_cells() {
        let snap = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        let rec = TicketRecord::from_raw(
            row(&[
                ("Ticket", "T-1"),
                ("Created", "31-Dec-23"),
                ("Assigned", "alice"),
            ]),
            None,
            snap,
        );
        assert_eq!(rec.ticket(), "T-1");
        assert_eq!(rec.status(), "");
        assert_eq!(rec.fields.get(PRIORITY).map(String::as_str), Some(""));
        assert!(!rec.fields.contains_key(CREATED));
        assert_eq!(rec.get("Assigned").as_deref(), Some("alice"));
        assert_eq!(rec.get(CREATED), None);
        assert_eq!(
            rec.get(SNAPSHOT_DATE).as_deref(),
            Some("2024-01-05T00:00:00.000Z")
        );
    }

    #[test]
    fn json_carries_nullable_created() {
        let snap = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        let rec = TicketRecord::from_raw(row(&[("Ticket", "T-2")]), None, snap);
        let json = rec.to_json();
        assert_eq!(json["Ticket"], "T-2");
        assert!(json["Created"].is_null());
        assert_eq!(json["SnapshotDate"], "2024-01-05T00:00:00.000Z");
    }
}
