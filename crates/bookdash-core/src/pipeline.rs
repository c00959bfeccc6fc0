//! Pipeline orchestration
//!
//! Ties the store, normalizer, reporting, estimator and insight layers
//! together behind one handle. Raw rows are fetched once and normalized
//! into a snapshot that is cached for a configurable TTL; every dashboard
//! and estimate call reads from the snapshot instead of re-fetching.
//!
//! Cache semantics are last-writer-wins: concurrent refreshes may both
//! fetch, and whichever finishes last replaces the snapshot. Both results
//! are normalized from full fetches, so either is valid. Inserting a
//! record invalidates the snapshot so the next read sees it.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use tracing::{debug, info};

use crate::ai::GenClient;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::estimator;
use crate::ingest;
use crate::insight::InsightGenerator;
use crate::models::{
    CleanDataset, Estimate, EstimateRequest, FilterSpec, InsightResult, NewSalesRecord,
    NormalizeReport,
};
use crate::report::{self, DashboardData};
use crate::store::{RecordStore, StoreClient};

/// A normalized dataset fetched at a point in time
pub struct Snapshot {
    pub dataset: CleanDataset,
    pub report: NormalizeReport,
    fetched_at: Instant,
}

impl Snapshot {
    pub fn age(&self) -> std::time::Duration {
        self.fetched_at.elapsed()
    }
}

/// Reachability of the pipeline's external dependencies
pub struct PipelineStatus {
    pub store_ok: bool,
    pub store_host: String,
    pub generation_ok: bool,
    pub models: Vec<String>,
}

/// Central handle over the whole analytics pipeline
pub struct Pipeline {
    store: StoreClient,
    config: AppConfig,
    insight: InsightGenerator,
    cache: RwLock<Option<Arc<Snapshot>>>,
}

impl Pipeline {
    /// Build a pipeline with production backends from the configuration.
    pub fn new(config: AppConfig) -> Self {
        let timeout = config.chain.timeout;
        let store = StoreClient::supabase(&config.store.url, &config.store.key, timeout);
        let client = GenClient::gemini(&config.gemini_api_key, timeout);
        Self::with_parts(store, client, config)
    }

    /// Build a pipeline from explicit backends. Used by tests to swap in
    /// mock stores and generation clients.
    pub fn with_parts(store: StoreClient, client: GenClient, config: AppConfig) -> Self {
        let insight = InsightGenerator::new(client, config.chain.clone());
        Self {
            store,
            config,
            insight,
            cache: RwLock::new(None),
        }
    }

    /// Current snapshot, refreshed from the store when absent or expired.
    pub async fn snapshot(&self) -> Result<Arc<Snapshot>> {
        if let Some(snapshot) = self.cached() {
            if snapshot.age() < self.config.chain.snapshot_ttl {
                debug!(age_secs = snapshot.age().as_secs(), "Snapshot cache hit");
                return Ok(snapshot);
            }
        }
        self.refresh().await
    }

    /// Fetch and normalize unconditionally, replacing the cached snapshot.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>> {
        let raw_rows = self.store.select_all(&self.config.store.table).await?;
        let (dataset, report) = ingest::normalize(&raw_rows);

        info!(
            raw = report.raw_rows,
            kept = report.kept,
            dropped = report.dropped,
            "Refreshed dataset snapshot"
        );

        let snapshot = Arc::new(Snapshot {
            dataset,
            report,
            fetched_at: Instant::now(),
        });
        self.store_snapshot(Some(snapshot.clone()));
        Ok(snapshot)
    }

    /// Dashboard aggregates for the given filter.
    pub async fn dashboard(&self, spec: &FilterSpec) -> Result<DashboardData> {
        let snapshot = self.snapshot().await?;
        let view = report::apply(&snapshot.dataset, spec);
        Ok(DashboardData::from_view(&view))
    }

    /// Fit a revenue model on the full clean dataset and evaluate the
    /// request against it. The model is refit on every call so it always
    /// reflects the current snapshot.
    pub async fn estimate(&self, request: &EstimateRequest) -> Result<Estimate> {
        request.validate()?;
        let snapshot = self.snapshot().await?;
        let model = estimator::fit(snapshot.dataset.records())?;
        Ok(model.predict(request))
    }

    /// Estimate plus generated narrative. The numeric estimate is computed
    /// first and survives regardless of what the insight layer does; only
    /// estimation failures propagate as errors.
    pub async fn advise(&self, request: &EstimateRequest) -> Result<(Estimate, InsightResult)> {
        request.validate()?;
        let snapshot = self.snapshot().await?;
        let model = estimator::fit(snapshot.dataset.records())?;
        let estimate = model.predict(request);

        let view = report::apply(&snapshot.dataset, &FilterSpec::all());
        let kpis = view.kpis();
        let insight = self.insight.generate(&estimate, request, Some(&kpis)).await;

        Ok((estimate, insight))
    }

    /// Insert a new record and invalidate the snapshot.
    pub async fn add_record(&self, record: &NewSalesRecord) -> Result<()> {
        self.store.insert(&self.config.store.table, record).await?;
        self.store_snapshot(None);
        Ok(())
    }

    /// Insert a batch of imported records, stopping on the first failure.
    /// Returns how many records were inserted.
    pub async fn import_records(&self, records: &[NewSalesRecord]) -> Result<usize> {
        let mut inserted = 0;
        for record in records {
            self.store.insert(&self.config.store.table, record).await?;
            inserted += 1;
        }
        if inserted > 0 {
            self.store_snapshot(None);
        }
        info!(inserted, "Imported records");
        Ok(inserted)
    }

    /// Check reachability of the store and the generation service.
    pub async fn status(&self) -> PipelineStatus {
        PipelineStatus {
            store_ok: self.store.health_check().await,
            store_host: self.store.host().to_string(),
            generation_ok: self.insight.health_check().await,
            models: self.insight.models().to_vec(),
        }
    }

    pub fn table(&self) -> &str {
        &self.config.store.table
    }

    /// True when the error indicates the store itself is unreachable.
    pub fn is_store_error(err: &Error) -> bool {
        matches!(err, Error::Store(_))
    }

    fn cached(&self) -> Option<Arc<Snapshot>> {
        self.cache.read().ok().and_then(|guard| guard.clone())
    }

    fn store_snapshot(&self, snapshot: Option<Arc<Snapshot>>) {
        if let Ok(mut guard) = self.cache.write() {
            *guard = snapshot;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::time::Duration;

    fn test_config() -> AppConfig {
        AppConfig {
            store: crate::config::StoreConfig {
                url: "memory://localhost".to_string(),
                key: "test".to_string(),
                table: "penjualan_buku".to_string(),
            },
            gemini_api_key: "test".to_string(),
            chain: crate::config::ChainConfig::default(),
        }
    }

    fn row(genre: &str, units: u64, rating: f64, revenue: f64) -> crate::models::RawRow {
        json!({
            "genre": genre,
            "units_sold": units,
            "book_average_rating": rating,
            "publisher_revenue": revenue,
        })
        .as_object()
        .unwrap()
        .clone()
    }

    fn test_pipeline(rows: Vec<crate::models::RawRow>) -> Pipeline {
        Pipeline::with_parts(
            StoreClient::memory(rows),
            GenClient::mock(),
            test_config(),
        )
    }

    #[tokio::test]
    async fn test_dashboard_from_store_rows() {
        let pipeline = test_pipeline(vec![
            row("Fiction", 100, 4.0, 1000.0),
            row("Romance", 50, 3.0, 500.0),
        ]);

        let data = pipeline.dashboard(&FilterSpec::all()).await.unwrap();
        assert_eq!(data.kpis.record_count, 2);
        assert_eq!(data.kpis.total_units, 150);
        assert!((data.kpis.total_revenue - 1500.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_snapshot_is_cached() {
        let pipeline = test_pipeline(vec![row("Fiction", 100, 4.0, 1000.0)]);

        let first = pipeline.snapshot().await.unwrap();
        let second = pipeline.snapshot().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_insert_invalidates_snapshot() {
        let pipeline = test_pipeline(vec![row("Fiction", 100, 4.0, 1000.0)]);

        let first = pipeline.snapshot().await.unwrap();
        assert_eq!(first.dataset.len(), 1);

        let record = NewSalesRecord {
            title: None,
            author: None,
            genre: "Romance".to_string(),
            publisher: None,
            units_sold: 50,
            average_rating: 3.5,
            gross_revenue: 500.0,
            transaction_date: None,
            import_hash: None,
        };
        pipeline.add_record(&record).await.unwrap();

        let second = pipeline.snapshot().await.unwrap();
        assert_eq!(second.dataset.len(), 2);
    }

    #[tokio::test]
    async fn test_estimate_against_two_known_rows() {
        let pipeline = test_pipeline(vec![
            row("Fiction", 100, 4.0, 5_000_000.0),
            row("Fiction", 200, 4.5, 9_500_000.0),
        ]);

        let request = EstimateRequest {
            target_units: 150,
            target_rating: 4.2,
            target_genre: None,
        };
        let estimate = pipeline.estimate(&request).await.unwrap();
        assert!(estimate.point_value > 5_000_000.0);
        assert!(estimate.point_value < 9_500_000.0);
    }

    #[tokio::test]
    async fn test_estimate_insufficient_data() {
        let pipeline = test_pipeline(vec![row("Fiction", 100, 4.0, 5_000_000.0)]);

        let request = EstimateRequest {
            target_units: 150,
            target_rating: 4.2,
            target_genre: None,
        };
        assert!(matches!(
            pipeline.estimate(&request).await,
            Err(Error::InsufficientData(_))
        ));
    }

    #[tokio::test]
    async fn test_advise_returns_estimate_and_narrative() {
        let pipeline = test_pipeline(vec![
            row("Fiction", 100, 4.0, 5_000_000.0),
            row("Fiction", 200, 4.5, 9_500_000.0),
        ]);

        let request = EstimateRequest {
            target_units: 150,
            target_rating: 4.2,
            target_genre: Some("Fiction".to_string()),
        };
        let (estimate, insight) = pipeline.advise(&request).await.unwrap();
        assert!(estimate.point_value > 0.0);
        assert!(insight.generated);
    }

    #[tokio::test]
    async fn test_unreachable_store_propagates() {
        let pipeline = Pipeline::with_parts(
            StoreClient::Memory(MemoryStore::unreachable()),
            GenClient::mock(),
            test_config(),
        );

        let err = pipeline.dashboard(&FilterSpec::all()).await.unwrap_err();
        assert!(Pipeline::is_store_error(&err));
    }

    #[tokio::test]
    async fn test_expired_snapshot_refetches() {
        let mut config = test_config();
        config.chain.snapshot_ttl = Duration::from_secs(0);
        let pipeline = Pipeline::with_parts(
            StoreClient::memory(vec![row("Fiction", 100, 4.0, 1000.0)]),
            GenClient::mock(),
            config,
        );

        let first = pipeline.snapshot().await.unwrap();
        let second = pipeline.snapshot().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
