//! Bookdash Core Library
//!
//! Shared functionality for the Bookdash sales analytics pipeline:
//! - Record store adapter over Supabase PostgREST
//! - Normalization of raw store rows into a typed clean dataset
//! - Filtered KPI and grouping reports for the dashboard
//! - Least-squares revenue estimation with confidence banding
//! - Gemini-backed insight generation with an ordered model fallback chain
//! - CSV import with dedup hashing

pub mod ai;
pub mod config;
pub mod error;
pub mod estimator;
pub mod import;
pub mod ingest;
pub mod insight;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod store;

/// Test utilities including mock Gemini and Supabase servers
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{GenBackend, GenClient, GeminiBackend, MockBackend};
pub use config::{AppConfig, ChainConfig, GenOptions, StoreConfig};
pub use error::{Error, Result};
pub use estimator::RevenueModel;
pub use insight::InsightGenerator;
pub use models::{
    CleanDataset, ConfidenceBand, Estimate, EstimateRequest, FilterSpec, InsightResult,
    KpiSummary, NewSalesRecord, NormalizeReport, RawRow, SalesRecord,
};
pub use pipeline::{Pipeline, PipelineStatus, Snapshot};
pub use report::{DashboardData, FilteredView};
pub use store::{MemoryStore, RecordStore, StoreClient, SupabaseStore};
