use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::DateParseError;

/// Month abbreviations accepted by the `DD-Mon-YY` format (case-insensitive).
const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// The known formats, tried in this order. First hit wins.
const KNOWN_FORMATS: [fn(&str) -> Option<NaiveDate>; 3] =
    [parse_day_mon_yy, parse_yyyy_mm_dd, parse_mm_dd_yy];

/// `%Y` in the layouts below takes one to four digits; anything earlier than
/// this is a short year that slipped through, not a real date.
const MIN_FLEXIBLE_YEAR: i32 = 1000;

/// Last-resort datetime layouts, read as UTC when they carry no offset.
const FLEXIBLE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Last-resort date-only layouts, midnight UTC.
const FLEXIBLE_DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Normalize a raw `Created` value.
///
/// - `None`, blank, or `nan` (any case) → `Ok(None)`: no date was recorded.
/// - `DD-Mon-YY`, `YYYY-MM-DD`, `MM/DD/YY` in that order; two-digit years are `2000 + yy`.
/// - Otherwise RFC 3339, RFC 2822 and a handful of common machine layouts.
/// - Anything else is an error carrying the literal.
pub fn normalize_date(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, DateParseError> {
    let s = match raw.map(str::trim) {
        None => return Ok(None),
        Some(s) if s.is_empty() || s.eq_ignore_ascii_case("nan") => return Ok(None),
        Some(s) => s,
    };

    if let Some(date) = KNOWN_FORMATS.iter().find_map(|f| f(s)) {
        return Ok(Some(midnight_utc(date)));
    }

    parse_flexible(s).map(Some).ok_or_else(|| DateParseError {
        value: raw.unwrap_or_default().to_string(),
    })
}

/// `NaiveDate` at 00:00:00 UTC.
pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

fn two_digit_year(s: &str) -> Option<i32> {
    if s.len() != 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(2000 + s.parse::<i32>().ok()?)
}

fn fixed_digits(s: &str, len: usize) -> Option<u32> {
    if s.len() != len || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// One or two digits, as days and months are written by hand.
fn short_digits(s: &str) -> Option<u32> {
    match s.len() {
        1 | 2 => fixed_digits(s, s.len()),
        _ => None,
    }
}

/// Four digits as written, or two read as `2000 + yy`.
fn full_or_two_digit_year(s: &str) -> Option<i32> {
    match s.len() {
        4 => fixed_digits(s, 4).map(|y| y as i32),
        _ => two_digit_year(s),
    }
}

/// `31-Dec-23`, day may be one or two digits.
fn parse_day_mon_yy(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('-');
    let (d, m, y) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let day = short_digits(d)?;
    let month = MONTHS
        .iter()
        .position(|name| name.eq_ignore_ascii_case(m))? as u32
        + 1;
    NaiveDate::from_ymd_opt(two_digit_year(y)?, month, day)
}

/// `2023-12-31`; a two-digit year (`23-12-31`) is `2000 + yy`.
fn parse_yyyy_mm_dd(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('-');
    let (y, m, d) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(
        full_or_two_digit_year(y)?,
        fixed_digits(m, 2)?,
        fixed_digits(d, 2)?,
    )
}

/// `12/31/23`, month and day may be one or two digits (`1/5/24`).
fn parse_mm_dd_yy(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('/');
    let (m, d, y) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(two_digit_year(y)?, short_digits(m)?, short_digits(d)?)
}

fn parse_flexible(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(ndt) = FLEXIBLE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| {
            NaiveDateTime::parse_from_str(s, fmt)
                .ok()
                .filter(|dt| dt.year() >= MIN_FLEXIBLE_YEAR)
        })
    {
        return Some(Utc.from_utc_datetime(&ndt));
    }
    FLEXIBLE_DATE_FORMATS
        .iter()
        .find_map(|fmt| {
            NaiveDate::parse_from_str(s, fmt)
                .ok()
                .filter(|d| d.year() >= MIN_FLEXIBLE_YEAR)
        })
        .map(midnight_utc)
}
