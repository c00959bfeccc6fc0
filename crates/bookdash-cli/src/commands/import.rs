//! CSV import command

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use bookdash_core::{import, Pipeline};

pub async fn cmd_import(pipeline: &Pipeline, file: &Path, dry_run: bool) -> Result<()> {
    let reader = File::open(file)
        .with_context(|| format!("Failed to open {}", file.display()))?;

    let records = import::parse_csv(reader)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    if records.is_empty() {
        println!("No records found in {}.", file.display());
        return Ok(());
    }

    println!("📥 Parsed {} records from {}", records.len(), file.display());

    if dry_run {
        for record in records.iter().take(5) {
            println!(
                "   {} | {} | {} units | rating {:.1} | revenue {:.0}",
                record.title.as_deref().unwrap_or("-"),
                record.genre,
                record.units_sold,
                record.average_rating,
                record.gross_revenue,
            );
        }
        if records.len() > 5 {
            println!("   ... and {} more", records.len() - 5);
        }
        println!("Dry run: nothing inserted.");
        return Ok(());
    }

    let inserted = pipeline.import_records(&records).await?;
    println!("✅ Inserted {} records into {}.", inserted, pipeline.table());

    Ok(())
}
