//! Bookdash CLI - Book sales analytics dashboard
//!
//! Usage:
//!   bookdash status                        Check store/generation reachability
//!   bookdash report kpis                   Headline KPIs
//!   bookdash estimate -u 150 -r 4.2        Estimate revenue, add --advise for prose
//!   bookdash import --file sales.csv       Import sales records
//!
//! Credentials come from SUPABASE_URL, SUPABASE_KEY and GEMINI_API_KEY.

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let pipeline = commands::build_pipeline(cli.config.as_deref())?;

    match cli.command {
        Commands::Status => commands::cmd_status(&pipeline).await,
        Commands::Report { report_type } => match report_type {
            ReportType::Kpis { filter } => commands::cmd_report_kpis(&pipeline, &filter).await,
            ReportType::Genres { filter } => commands::cmd_report_genres(&pipeline, &filter).await,
            ReportType::Publishers { filter } => {
                commands::cmd_report_publishers(&pipeline, &filter).await
            }
            ReportType::Trend { filter } => commands::cmd_report_trend(&pipeline, &filter).await,
        },
        Commands::Estimate {
            units,
            rating,
            genre,
            advise,
        } => commands::cmd_estimate(&pipeline, units, rating, genre, advise).await,
        Commands::Records { action } => match action {
            None | Some(RecordsAction::List { limit: 20 }) => {
                commands::cmd_records_list(&pipeline, 20).await
            }
            Some(RecordsAction::List { limit }) => {
                commands::cmd_records_list(&pipeline, limit).await
            }
            Some(RecordsAction::Add {
                title,
                author,
                genre,
                units,
                rating,
                revenue,
                publisher,
                date,
            }) => {
                commands::cmd_records_add(
                    &pipeline, title, author, genre, units, rating, revenue, publisher, date,
                )
                .await
            }
        },
        Commands::Import { file, dry_run } => {
            commands::cmd_import(&pipeline, &file, dry_run).await
        }
    }
}
