// src/query.rs
//! Consumer-side reduction: one record per logical ticket, its latest snapshot.

use std::{cmp::Ordering, collections::HashMap};

use crate::process::record::{TicketRecord, CREATED, SNAPSHOT_DATE};

/// Keep, for each `Ticket`, the record with the greatest `SnapshotDate`.
///
/// Ties on the snapshot date keep whichever record came first in `records`.
/// Output follows the order in which each ticket first appeared.
pub fn latest_per_ticket<I>(records: I) -> Vec<TicketRecord>
where
    I: IntoIterator<Item = TicketRecord>,
{
    let mut slot: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<TicketRecord> = Vec::new();
    for rec in records {
        match slot.get(rec.ticket()).copied() {
            Some(i) => {
                if rec.snapshot_date > out[i].snapshot_date {
                    out[i] = rec;
                }
            }
            None => {
                slot.insert(rec.ticket().to_string(), out.len());
                out.push(rec);
            }
        }
    }
    out
}

/// Membership filters; an empty list places no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub status: Vec<String>,
    pub priority: Vec<String>,
}

impl TicketFilter {
    pub fn matches(&self, rec: &TicketRecord) -> bool {
        let ok = |allowed: &[String], value: &str| {
            allowed.is_empty() || allowed.iter().any(|a| a == value)
        };
        ok(self.status.as_slice(), rec.status())
            && ok(self.priority.as_slice(), rec.priority())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            other => Err(format!("unknown sort order {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    /// Nulls sort last in either direction.
    fn compare(&self, a: &TicketRecord, b: &TicketRecord) -> Ordering {
        match self.field.as_str() {
            CREATED => match (a.created, b.created) {
                (Some(x), Some(y)) => self.directed(x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SNAPSHOT_DATE => self.directed(a.snapshot_date.cmp(&b.snapshot_date)),
            name => match (a.fields.get(name), b.fields.get(name)) {
                (Some(x), Some(y)) => self.directed(x.cmp(y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }

    fn directed(&self, ord: Ordering) -> Ordering {
        match self.order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    }
}

/// Stable sort in place.
pub fn sort_records(records: &mut [TicketRecord], sort: &SortSpec) {
    records.sort_by(|a, b| sort.compare(a, b));
}

/// Latest snapshot per ticket, then filter, then (optionally) sort.
///
/// Filters look at the latest snapshot only, so a ticket that has since
/// moved out of the requested status is not returned in a stale state.
pub fn query_latest<I>(
    records: I,
    filter: &TicketFilter,
    sort: Option<&SortSpec>,
) -> Vec<TicketRecord>
where
    I: IntoIterator<Item = TicketRecord>,
{
    let mut out: Vec<TicketRecord> = latest_per_ticket(records)
        .into_iter()
        .filter(|r| filter.matches(r))
        .collect();
    if let Some(sort) = sort {
        sort_records(&mut out, sort);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn rec(id: &str, status: &str, priority: &str, snap: u32) -> TicketRecord {
        TicketRecord::from_raw(
            [
                ("Ticket".to_string(), id.to_string()),
                ("Status".to_string(), status.to_string()),
                ("Priority".to_string(), priority.to_string()),
            ]
            .into_iter()
            .collect(),
            None,
            day(snap),
        )
    }

    #[test]
    fn keeps_latest_snapshot_per_ticket() {
        let out = latest_per_ticket(vec![
            rec("T-1", "Open", "High", 5),
            rec("T-2", "Open", "Low", 5),
            rec("T-1", "Closed", "High", 12),
            rec("T-2", "Stale", "Low", 1),
        ]);
        let got: Vec<_> = out.iter().map(|r| (r.ticket(), r.status())).collect();
        assert_eq!(got, vec![("T-1", "Closed"), ("T-2", "Open")]);
    }

    #[test]
    fn equal_snapshots_keep_first_inserted() {
        let out = latest_per_ticket(vec![
            rec("T-1", "First", "High", 5),
            rec("T-1", "Second", "High", 5),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].status(), "First");
    }

    #[test]
    fn filters_apply_after_reduction() {
        let records = vec![
            rec("T-1", "Open", "High", 5),
            rec("T-1", "Closed", "High", 12),
            rec("T-2", "Open", "Low", 12),
        ];
        let filter = TicketFilter {
            status: vec!["Open".into()],
            priority: vec![],
        };
        let out = query_latest(records, &filter, None);
        let ids: Vec<_> = out.iter().map(|r| r.ticket()).collect();
        assert_eq!(ids, vec!["T-2"]);
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = TicketFilter::default();
        assert!(filter.matches(&rec("T-1", "Whatever", "", 1)));

        let filter = TicketFilter {
            status: vec![],
            priority: vec!["High".into(), "Low".into()],
        };
        assert!(filter.matches(&rec("T-1", "Open", "Low", 1)));
        assert!(!filter.matches(&rec("T-1", "Open", "Medium", 1)));
    }

    #[test]
    fn sorts_by_field_and_puts_nulls_last() {
        let mut records = vec![
            rec("T-1", "Open", "High", 5),
            rec("T-2", "Closed", "Low", 3),
            rec("T-3", "Pending", "Low", 9),
        ];
        records[0].created = Some(day(2));
        records[2].created = Some(day(1));

        let by_status = SortSpec {
            field: "Status".into(),
            order: SortOrder::Ascending,
        };
        sort_records(&mut records, &by_status);
        let ids: Vec<_> = records.iter().map(|r| r.ticket()).collect();
        assert_eq!(ids, vec!["T-2", "T-1", "T-3"]);

        let by_created = SortSpec {
            field: "Created".into(),
            order: SortOrder::Descending,
        };
        sort_records(&mut records, &by_created);
        let ids: Vec<_> = records.iter().map(|r| r.ticket()).collect();
        assert_eq!(ids, vec!["T-1", "T-3", "T-2"]);

        let by_snapshot = SortSpec {
            field: "SnapshotDate".into(),
            order: "desc".parse().unwrap(),
        };
        sort_records(&mut records, &by_snapshot);
        let ids: Vec<_> = records.iter().map(|r| r.ticket()).collect();
        assert_eq!(ids, vec!["T-3", "T-1", "T-2"]);
    }
}
