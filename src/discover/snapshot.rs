use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static FILENAME_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})").expect("static regex"));

/// First `YYYY-MM-DD` in `filename`, if it is a real calendar date.
///
/// Only the first match is considered; `tickets-2024-13-40.csv` yields `None`
/// even if a later substring would parse.
pub fn extract_date_from_filename(filename: &str) -> Option<NaiveDate> {
    let m = FILENAME_DATE.find(filename)?;
    NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d").ok()
}
