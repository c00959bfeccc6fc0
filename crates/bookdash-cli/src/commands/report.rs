//! Dashboard report commands

use anyhow::Result;
use bookdash_core::{FilterSpec, Pipeline};

use crate::cli::FilterArgs;
use super::format_money;

impl FilterArgs {
    /// Convert the CLI flags into a filter; "all" means no restriction
    pub fn to_spec(&self) -> FilterSpec {
        FilterSpec::all()
            .with_genre(self.genre.clone())
            .with_period(self.period.clone())
            .with_min_rating(self.min_rating)
    }
}

pub async fn cmd_report_kpis(pipeline: &Pipeline, filter: &FilterArgs) -> Result<()> {
    let data = pipeline.dashboard(&filter.to_spec()).await?;
    let kpis = data.kpis;

    println!();
    println!("📈 Sales KPIs");
    println!("   ─────────────────────────────────────────────");
    println!("   Total revenue:  {}", format_money(kpis.total_revenue));
    println!("   Units sold:     {}", kpis.total_units);
    println!("   Mean rating:    {:.2}", kpis.mean_rating);
    println!("   Records:        {}", kpis.record_count);
    println!();

    Ok(())
}

pub async fn cmd_report_genres(pipeline: &Pipeline, filter: &FilterArgs) -> Result<()> {
    let data = pipeline.dashboard(&filter.to_spec()).await?;

    if data.units_by_genre.is_empty() {
        println!("No records match the filter.");
        return Ok(());
    }

    println!();
    println!("📚 Units sold by genre");
    println!("   ─────────────────────────────────────────────");
    for (genre, units) in &data.units_by_genre {
        println!("   {:<24} {}", genre, units);
    }
    println!();

    Ok(())
}

pub async fn cmd_report_publishers(pipeline: &Pipeline, filter: &FilterArgs) -> Result<()> {
    let data = pipeline.dashboard(&filter.to_spec()).await?;

    if data.top_publishers.is_empty() {
        println!("No records with a publisher match the filter.");
        return Ok(());
    }

    println!();
    println!("🏆 Top publishers by revenue");
    println!("   ─────────────────────────────────────────────");
    for (i, (publisher, revenue)) in data.top_publishers.iter().enumerate() {
        println!("   {}. {:<22} {}", i + 1, publisher, format_money(*revenue));
    }
    println!();

    Ok(())
}

pub async fn cmd_report_trend(pipeline: &Pipeline, filter: &FilterArgs) -> Result<()> {
    let data = pipeline.dashboard(&filter.to_spec()).await?;

    if data.revenue_by_period.is_empty() {
        println!("No records match the filter.");
        return Ok(());
    }

    println!();
    println!("📅 Revenue by month");
    println!("   ─────────────────────────────────────────────");
    for (period, revenue) in &data.revenue_by_period {
        println!("   {:<10} {}", period, format_money(*revenue));
    }
    println!();

    Ok(())
}
