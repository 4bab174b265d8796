//! Day-index normalization.
//!
//! Converts raw date-keyed rows into a [`SparseSeries`] keyed by signed day
//! offsets relative to a fixed reference end date.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use coinset_core::{DayOffset, Error, Observation, Result, SparseSeries};

use crate::source::RawRow;

/// Date-time layouts accepted before falling back to bare dates.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Number of whole calendar days from `end_date` to `date`.
///
/// Dates before the end date yield negative offsets.
#[inline]
pub fn day_offset(end_date: NaiveDate, date: NaiveDate) -> DayOffset {
    date.signed_duration_since(end_date).num_days()
}

/// Parse an observation date, discarding any time of day and zone.
///
/// Zone information is dropped, not converted: `2021-12-07T23:00:00-05:00`
/// is the 7th.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local().date());
    }
    if let Some(date) = parse_naive(s) {
        return Some(date);
    }
    // Trailing zone token, e.g. "2021-12-08 00:00:00 UTC".
    let (head, _zone) = s.rsplit_once(char::is_whitespace)?;
    parse_naive(head.trim_end())
}

fn parse_naive(s: &str) -> Option<NaiveDate> {
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok().map(|dt| dt.date()))
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        })
}

fn parse_number(asset: &str, line: usize, field: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| Error::parse(asset, line, format!("invalid {field} {raw:?}: {e}")))
}

/// Convert one raw row into an observation.
pub fn normalize_row(asset: &str, end_date: NaiveDate, row: &RawRow) -> Result<Observation> {
    let date = parse_date(&row.date)
        .ok_or_else(|| Error::parse(asset, row.line, format!("invalid date {:?}", row.date)))?;

    Ok(Observation {
        day_offset: day_offset(end_date, date),
        price: parse_number(asset, row.line, "price", &row.price)?,
        volume: parse_number(asset, row.line, "volume", &row.volume)?,
    })
}

/// Normalize every row of an asset into a sparse series.
///
/// The first unparseable row aborts the asset.
pub fn normalize_rows(asset: &str, end_date: NaiveDate, rows: &[RawRow]) -> Result<SparseSeries> {
    let mut series = SparseSeries::new();
    for row in rows {
        series.insert(normalize_row(asset, end_date, row)?);
    }
    Ok(series)
}
