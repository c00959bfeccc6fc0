//! CSV import of sales rows
//!
//! Accepts the export format of the store itself (header-named columns,
//! any of the recognized aliases) rather than a fixed column order, and
//! applies the same numeric and date coercion as the normalizer. Unlike
//! normalization, which silently drops bad rows it did not author, an
//! import fails loudly: a row missing a required numeric aborts the parse
//! with the offending line number.

use csv::{ReaderBuilder, StringRecord};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::io::Read;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ingest::{
    coerce_date, coerce_rating, coerce_revenue, coerce_string, coerce_units, field,
    DATE_COLUMNS, GENRE_COLUMNS, RATING_COLUMNS, REVENUE_COLUMNS, TITLE_COLUMNS, UNITS_COLUMNS,
};
use crate::models::{NewSalesRecord, RawRow, UNCATEGORIZED};

/// Parse CSV data into records ready for insertion
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<NewSalesRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let mut records = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let row = record_to_row(&headers, &record);
        // Header line is line 1
        let line = i + 2;

        let units_sold = field(&row, UNITS_COLUMNS)
            .and_then(coerce_units)
            .ok_or_else(|| Error::Import(format!("Line {}: missing or invalid units", line)))?;
        let average_rating = field(&row, RATING_COLUMNS)
            .and_then(coerce_rating)
            .ok_or_else(|| Error::Import(format!("Line {}: missing or invalid rating", line)))?;
        let gross_revenue = field(&row, REVENUE_COLUMNS)
            .and_then(coerce_revenue)
            .ok_or_else(|| Error::Import(format!("Line {}: missing or invalid revenue", line)))?;

        let title = field(&row, TITLE_COLUMNS).and_then(coerce_string);
        let transaction_date = field(&row, DATE_COLUMNS).and_then(coerce_date);
        let genre = field(&row, GENRE_COLUMNS)
            .and_then(coerce_string)
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let import_hash = generate_hash(title.as_deref(), &transaction_date, gross_revenue);

        records.push(NewSalesRecord {
            title,
            author: field(&row, &["author"]).and_then(coerce_string),
            genre,
            publisher: field(&row, &["publisher"]).and_then(coerce_string),
            units_sold,
            average_rating,
            gross_revenue,
            transaction_date,
            import_hash: Some(import_hash),
        });
    }

    debug!("Parsed {} sales records", records.len());
    Ok(records)
}

/// Convert a CSV record to a raw row using headers as keys, so the
/// normalizer's alias lookup and coercion apply unchanged.
fn record_to_row(headers: &StringRecord, record: &StringRecord) -> RawRow {
    let mut row = RawRow::new();
    for (i, header) in headers.iter().enumerate() {
        if let Some(value) = record.get(i) {
            row.insert(
                header.trim().to_string(),
                Value::String(value.to_string()),
            );
        }
    }
    row
}

/// Dedup hash over the identifying fields of a sale
fn generate_hash(
    title: Option<&str>,
    date: &Option<chrono::NaiveDate>,
    revenue: f64,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.unwrap_or("").as_bytes());
    if let Some(date) = date {
        hasher.update(date.to_string().as_bytes());
    }
    hasher.update(revenue.to_be_bytes());
    hex::encode(hasher.finalize())
}
