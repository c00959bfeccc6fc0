//! Sales record commands (list, add)

use anyhow::{Context, Result};
use bookdash_core::{NewSalesRecord, Pipeline};
use chrono::NaiveDate;

use super::{format_money, truncate};

pub async fn cmd_records_list(pipeline: &Pipeline, limit: usize) -> Result<()> {
    let snapshot = pipeline.snapshot().await?;
    let records = snapshot.dataset.records();

    if records.is_empty() {
        println!("No clean records in the table.");
        return Ok(());
    }

    println!();
    println!(
        "📖 Sales records ({} shown of {} clean, {} dropped in normalization)",
        records.len().min(limit),
        snapshot.report.kept,
        snapshot.report.dropped
    );
    println!("   ──────────────────────────────────────────────────────────────");
    println!(
        "   {:<24} {:<14} {:>7} {:>6} {:>12}  {}",
        "Title", "Genre", "Units", "Rating", "Revenue", "Date"
    );

    for record in records.iter().take(limit) {
        println!(
            "   {:<24} {:<14} {:>7} {:>6.1} {:>12}  {}",
            truncate(record.title.as_deref().unwrap_or("-"), 24),
            truncate(&record.genre, 14),
            record.units_sold,
            record.average_rating,
            format_money(record.gross_revenue),
            record
                .date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    println!();

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn cmd_records_add(
    pipeline: &Pipeline,
    title: Option<String>,
    author: Option<String>,
    genre: String,
    units: u64,
    rating: f64,
    revenue: f64,
    publisher: Option<String>,
    date: Option<String>,
) -> Result<()> {
    let transaction_date = date
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("Invalid --date format (use YYYY-MM-DD)")?;

    if !(0.0..=5.0).contains(&rating) {
        anyhow::bail!("Rating {} outside [0.0, 5.0]", rating);
    }
    if revenue < 0.0 {
        anyhow::bail!("Revenue cannot be negative");
    }

    let record = NewSalesRecord {
        title,
        author,
        genre,
        publisher,
        units_sold: units,
        average_rating: rating,
        gross_revenue: revenue,
        transaction_date,
        import_hash: None,
    };

    pipeline.add_record(&record).await?;

    println!("✅ Record added to {}.", pipeline.table());
    Ok(())
}
