//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Bookdash - Book sales analytics from a Supabase table
#[derive(Parser)]
#[command(name = "bookdash")]
#[command(about = "Book sales dashboard, revenue estimator and insight generator", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a models.toml override (defaults to the data dir, then
    /// the embedded config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check store and generation-service reachability
    Status,

    /// Dashboard reports over the sales table
    Report {
        #[command(subcommand)]
        report_type: ReportType,
    },

    /// Estimate revenue for a hypothetical book
    Estimate {
        /// Projected units sold
        #[arg(short, long)]
        units: u64,

        /// Expected average rating (0.0 - 5.0)
        #[arg(short, long)]
        rating: f64,

        /// Genre for context in the generated narrative
        #[arg(short, long)]
        genre: Option<String>,

        /// Also generate a narrative insight for the estimate
        #[arg(long)]
        advise: bool,
    },

    /// Manage sales records
    Records {
        #[command(subcommand)]
        action: Option<RecordsAction>,
    },

    /// Import sales records from CSV
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Parse and report without inserting
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum ReportType {
    /// Headline KPIs (revenue, units, mean rating, record count)
    Kpis {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Units sold grouped by genre
    Genres {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Top five publishers by revenue
    Publishers {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Revenue per month, oldest first
    Trend {
        #[command(flatten)]
        filter: FilterArgs,
    },
}

/// Shared dashboard filter flags
#[derive(clap::Args)]
pub struct FilterArgs {
    /// Restrict to one genre ("all" for no restriction)
    #[arg(short, long, default_value = "all")]
    pub genre: String,

    /// Restrict to one YYYY-MM period ("all" for no restriction)
    #[arg(short, long, default_value = "all")]
    pub period: String,

    /// Minimum average rating, inclusive
    #[arg(short, long, default_value = "0.0")]
    pub min_rating: f64,
}

#[derive(Subcommand)]
pub enum RecordsAction {
    /// List records from the clean dataset
    List {
        /// Maximum number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Add a single sales record
    Add {
        /// Book title
        #[arg(long)]
        title: Option<String>,

        /// Author name
        #[arg(long)]
        author: Option<String>,

        /// Genre
        #[arg(short, long)]
        genre: String,

        /// Units sold
        #[arg(short, long)]
        units: u64,

        /// Average rating (0.0 - 5.0)
        #[arg(short, long)]
        rating: f64,

        /// Gross revenue
        #[arg(long)]
        revenue: f64,

        /// Publisher name
        #[arg(long)]
        publisher: Option<String>,

        /// Transaction date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
    },
}
