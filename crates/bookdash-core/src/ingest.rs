//! Normalization of raw store rows into the typed clean dataset
//!
//! The store hands back untyped JSON rows with locale-formatted numbers,
//! stringified dates, and inconsistent column names across page variants.
//! This module is the schema boundary: each row is mapped onto
//! [`SalesRecord`] explicitly, failing closed (drop the row) wherever the
//! required numerics cannot be coerced. A pure transform; the caller owns
//! caching across refresh intervals.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use tracing::debug;

use crate::models::{CleanDataset, NormalizeReport, RawRow, SalesRecord, UNCATEGORIZED};

/// Column aliases, checked in priority order
pub(crate) const UNITS_COLUMNS: &[&str] = &["units_sold"];
pub(crate) const RATING_COLUMNS: &[&str] = &[
    "book_average_rating",
    "average_rating",
    "author_rating",
    "rating",
];
pub(crate) const REVENUE_COLUMNS: &[&str] = &[
    "gross_sale",
    "gross_sales",
    "gross_revenue",
    "publisher_revenue",
];
pub(crate) const DATE_COLUMNS: &[&str] = &["transaction_date", "publish_date"];
const CREATED_COLUMNS: &[&str] = &["created_at", "inserted_at"];
pub(crate) const GENRE_COLUMNS: &[&str] = &["genre", "category"];
pub(crate) const TITLE_COLUMNS: &[&str] = &["title", "book_title"];

/// Convert raw rows into a clean dataset.
///
/// Rows missing any required numeric after coercion are dropped, not
/// errored; the counts are reported alongside the dataset. Output is
/// stably sorted ascending by date; undated rows keep arrival order
/// after the dated ones.
pub fn normalize(raw_rows: &[RawRow]) -> (CleanDataset, NormalizeReport) {
    let mut records = Vec::with_capacity(raw_rows.len());
    let mut dropped = 0usize;

    for (i, row) in raw_rows.iter().enumerate() {
        match coerce_row(row) {
            Some(record) => records.push(record),
            None => {
                dropped += 1;
                debug!(row = i, "Dropped row with missing required numerics");
            }
        }
    }

    // Stable sort keeps arrival order for equal dates and for the undated
    // tail bucket.
    records.sort_by(|a, b| match (a.date, b.date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let report = NormalizeReport {
        raw_rows: raw_rows.len(),
        kept: records.len(),
        dropped,
    };
    debug!(
        raw = report.raw_rows,
        kept = report.kept,
        dropped = report.dropped,
        "Normalized store rows"
    );

    (CleanDataset::new(records), report)
}

/// Map one raw row onto a `SalesRecord`, or `None` when a required
/// numeric is missing or unparsable.
fn coerce_row(row: &RawRow) -> Option<SalesRecord> {
    let units_sold = field(row, UNITS_COLUMNS).and_then(coerce_units)?;
    let average_rating = field(row, RATING_COLUMNS).and_then(coerce_rating)?;
    let gross_revenue = field(row, REVENUE_COLUMNS).and_then(coerce_revenue)?;

    // Transaction date first, creation timestamp as fallback
    let date = field(row, DATE_COLUMNS)
        .and_then(coerce_date)
        .or_else(|| field(row, CREATED_COLUMNS).and_then(coerce_date));

    let genre = field(row, GENRE_COLUMNS)
        .and_then(coerce_string)
        .unwrap_or_else(|| UNCATEGORIZED.to_string());

    Some(SalesRecord {
        title: field(row, TITLE_COLUMNS).and_then(coerce_string),
        author: field(row, &["author"]).and_then(coerce_string),
        genre,
        publisher: field(row, &["publisher"]).and_then(coerce_string),
        units_sold,
        average_rating,
        gross_revenue,
        date,
    })
}

/// First present, non-null value among the column aliases
pub(crate) fn field<'a>(row: &'a RawRow, columns: &[&str]) -> Option<&'a Value> {
    columns
        .iter()
        .find_map(|c| row.get(*c))
        .filter(|v| !v.is_null())
}

/// Coerce a JSON value into a float, tolerating locale-formatted strings.
///
/// Comma handling: with a period present, commas are thousands separators;
/// with commas only, a single comma is a decimal comma ("4,5" -> 4.5) and
/// multiple commas are thousands separators ("5,000,000" -> 5000000).
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            let cleaned = if s.contains('.') {
                s.replace(',', "")
            } else {
                match s.matches(',').count() {
                    0 => s.to_string(),
                    1 => s.replace(',', "."),
                    _ => s.replace(',', ""),
                }
            };
            cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// Units must be a whole non-negative number
pub(crate) fn coerce_units(value: &Value) -> Option<u64> {
    let n = coerce_number(value)?;
    if n < 0.0 || n.fract() != 0.0 || n > u64::MAX as f64 {
        return None;
    }
    Some(n as u64)
}

/// Ratings are clamped into [0.0, 5.0]
pub(crate) fn coerce_rating(value: &Value) -> Option<f64> {
    coerce_number(value).map(|n| n.clamp(0.0, 5.0))
}

/// Revenue cannot be negative
pub(crate) fn coerce_revenue(value: &Value) -> Option<f64> {
    coerce_number(value).filter(|n| *n >= 0.0)
}

/// Parse a date from plain-date or timestamp strings
pub(crate) fn coerce_date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    if s.is_empty() {
        return None;
    }

    // RFC 3339 timestamps (created_at columns)
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    let formats = [
        "%Y-%m-%d",          // 2024-01-15
        "%Y-%m-%d %H:%M:%S", // 2024-01-15 10:30:00
        "%m/%d/%Y",          // 01/15/2024
        "%d/%m/%Y",          // 15/01/2024 (European)
    ];
    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    None
}

/// Trimmed non-empty string
pub(crate) fn coerce_string(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
