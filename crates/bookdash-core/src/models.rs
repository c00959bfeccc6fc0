//! Data models for Bookdash
//!
//! These types cross the presentation boundary as plain data: the pipeline
//! consumes `FilterSpec` and `EstimateRequest` and produces `KpiSummary`,
//! `Estimate`, and `InsightResult`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A raw, untyped row as it arrives from the record store
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// Sentinel genre for rows without one
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Period label for rows without a parsable date
pub const UNKNOWN_PERIOD: &str = "unknown";

/// Filter sentinel that short-circuits a predicate
pub const ALL: &str = "all";

/// One sales transaction/title entry after coercion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesRecord {
    pub title: Option<String>,
    pub author: Option<String>,
    /// Categorical grouping key; defaults to [`UNCATEGORIZED`]
    pub genre: String,
    pub publisher: Option<String>,
    pub units_sold: u64,
    /// Rating in [0.0, 5.0]
    pub average_rating: f64,
    pub gross_revenue: f64,
    /// Transaction date; absent rows land in the "unknown" period bucket
    pub date: Option<NaiveDate>,
}

impl SalesRecord {
    /// Monthly period label ("YYYY-MM"), or [`UNKNOWN_PERIOD`] when undated
    pub fn period(&self) -> String {
        match self.date {
            Some(d) => d.format("%Y-%m").to_string(),
            None => UNKNOWN_PERIOD.to_string(),
        }
    }
}

/// The subset of ingested records that passed coercion, ordered by date.
///
/// Immutable once produced per refresh cycle; a refresh produces a new
/// dataset rather than mutating this one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanDataset {
    records: Vec<SalesRecord>,
}

impl CleanDataset {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Row counts from a normalization pass
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NormalizeReport {
    /// Rows received from the store
    pub raw_rows: usize,
    /// Rows that passed coercion
    pub kept: usize,
    /// Rows dropped for missing required numerics
    pub dropped: usize,
}

/// User-chosen predicates over the clean dataset.
///
/// A `None` dimension (or the "all" sentinel in CLI flags) short-circuits
/// that predicate; `min_rating` is an inclusive lower bound.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub genre: Option<String>,
    pub period: Option<String>,
    pub min_rating: f64,
}

impl FilterSpec {
    /// A filter that matches every record
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        let genre = genre.into();
        if genre != ALL {
            self.genre = Some(genre);
        }
        self
    }

    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        let period = period.into();
        if period != ALL {
            self.period = Some(period);
        }
        self
    }

    pub fn with_min_rating(mut self, min_rating: f64) -> Self {
        self.min_rating = min_rating;
        self
    }
}

/// Hypothetical input for the what-if estimator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateRequest {
    pub target_units: u64,
    pub target_rating: f64,
    pub target_genre: Option<String>,
}

impl EstimateRequest {
    /// Check the request against the documented input ranges
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.target_units == 0 {
            return Err(crate::error::Error::InvalidData(
                "target units must be positive".to_string(),
            ));
        }
        if !(0.0..=5.0).contains(&self.target_rating) {
            return Err(crate::error::Error::InvalidData(format!(
                "target rating {} outside [0.0, 5.0]",
                self.target_rating
            )));
        }
        Ok(())
    }
}

/// Heuristic three-level label derived from the input rating threshold.
///
/// Intentionally independent of the regression's statistical confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    Excellent,
    Good,
    AtRisk,
}

impl ConfidenceBand {
    /// Band for a target rating: >=4.5 excellent, >=3.5 good, else at risk
    pub fn from_rating(rating: f64) -> Self {
        if rating >= 4.5 {
            ConfidenceBand::Excellent
        } else if rating >= 3.5 {
            ConfidenceBand::Good
        } else {
            ConfidenceBand::AtRisk
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBand::Excellent => "excellent",
            ConfidenceBand::Good => "good",
            ConfidenceBand::AtRisk => "at_risk",
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConfidenceBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "excellent" => Ok(ConfidenceBand::Excellent),
            "good" => Ok(ConfidenceBand::Good),
            "at_risk" => Ok(ConfidenceBand::AtRisk),
            _ => Err(format!("Unknown confidence band: {}", s)),
        }
    }
}

/// Point estimate produced by the revenue model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Estimate {
    /// Predicted gross revenue, clamped at zero
    pub point_value: f64,
    pub confidence_band: ConfidenceBand,
}

/// Prose advice for an estimate. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightResult {
    /// The prompt submitted to the generation service
    pub prompt: String,
    /// Generated prose, or a neutral unavailable message
    pub narrative: String,
    /// False when the whole fallback chain was exhausted
    pub generated: bool,
}

/// Summary statistics over a filtered view
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total_revenue: f64,
    pub total_units: u64,
    /// Mean rating, 0.0 on an empty view
    pub mean_rating: f64,
    pub record_count: usize,
}

/// A record to be inserted into the store (e.g. from the add form or CSV import)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSalesRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub genre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    pub units_sold: u64,
    pub average_rating: f64,
    pub gross_revenue: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_date: Option<NaiveDate>,
    /// SHA-256 over (title, date, revenue) for deduplication on import
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_hash: Option<String>,
}
