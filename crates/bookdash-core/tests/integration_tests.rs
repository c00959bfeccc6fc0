//! Integration tests for bookdash-core
//!
//! These tests exercise the full fetch -> normalize -> report -> estimate
//! -> advise workflow through the pipeline's public API.

use bookdash_core::{
    import::parse_csv, AppConfig, ChainConfig, ConfidenceBand, Error, EstimateRequest,
    FilterSpec, GenClient, MockBackend, Pipeline, RawRow, StoreClient, StoreConfig,
};
use serde_json::json;

fn test_config() -> AppConfig {
    AppConfig {
        store: StoreConfig {
            url: "memory://localhost".to_string(),
            key: "test".to_string(),
            table: "penjualan_buku".to_string(),
        },
        gemini_api_key: "test".to_string(),
        chain: ChainConfig::default(),
    }
}

/// Raw rows the way the store returns them: locale-formatted strings,
/// mixed column aliases, one row with a missing revenue.
fn dirty_store_rows() -> Vec<RawRow> {
    let rows = json!([
        {
            "title": "Laskar Pelangi",
            "genre": "Fiction",
            "publisher": "Bentang",
            "units_sold": "100",
            "book_average_rating": "4,0",
            "publisher_revenue": "5,000,000",
            "publish_date": "2024-02-10"
        },
        {
            "title": "Bumi",
            "genre": "Fantasy",
            "publisher": "Gramedia",
            "units_sold": 200,
            "average_rating": 4.5,
            "gross_sale": 9500000,
            "transaction_date": "2024-01-05"
        },
        {
            "title": "Broken Row",
            "genre": "Fiction",
            "units_sold": 50,
            "book_average_rating": 3.9,
            "publisher_revenue": null
        }
    ]);

    rows.as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect()
}

fn pipeline_with(client: GenClient) -> Pipeline {
    Pipeline::with_parts(StoreClient::memory(dirty_store_rows()), client, test_config())
}

#[tokio::test]
async fn test_full_dashboard_workflow() {
    let pipeline = pipeline_with(GenClient::mock());

    // The broken row is dropped during normalization
    let snapshot = pipeline.snapshot().await.unwrap();
    assert_eq!(snapshot.report.raw_rows, 3);
    assert_eq!(snapshot.report.kept, 2);
    assert_eq!(snapshot.report.dropped, 1);

    // Records come out date-ascending
    let titles: Vec<_> = snapshot
        .dataset
        .records()
        .iter()
        .map(|r| r.title.as_deref().unwrap())
        .collect();
    assert_eq!(titles, vec!["Bumi", "Laskar Pelangi"]);

    let data = pipeline.dashboard(&FilterSpec::all()).await.unwrap();
    assert_eq!(data.kpis.record_count, 2);
    assert_eq!(data.kpis.total_units, 300);
    assert!((data.kpis.total_revenue - 14_500_000.0).abs() < 1e-6);
    assert!((data.kpis.mean_rating - 4.25).abs() < 1e-9);

    // Genre filter narrows the view
    let fiction = pipeline
        .dashboard(&FilterSpec::all().with_genre("Fiction"))
        .await
        .unwrap();
    assert_eq!(fiction.kpis.record_count, 1);
    assert_eq!(fiction.kpis.total_units, 100);
}

#[tokio::test]
async fn test_empty_filter_yields_zero_kpis() {
    let pipeline = pipeline_with(GenClient::mock());

    let data = pipeline
        .dashboard(&FilterSpec::all().with_genre("Horror"))
        .await
        .unwrap();
    assert_eq!(data.kpis.record_count, 0);
    assert_eq!(data.kpis.total_revenue, 0.0);
    assert_eq!(data.kpis.mean_rating, 0.0);
    assert!(data.units_by_genre.is_empty());
    assert!(data.top_publishers.is_empty());
}

#[tokio::test]
async fn test_estimate_interpolates_between_rows() {
    let pipeline = pipeline_with(GenClient::mock());

    let request = EstimateRequest {
        target_units: 150,
        target_rating: 4.2,
        target_genre: None,
    };
    let estimate = pipeline.estimate(&request).await.unwrap();

    assert!(estimate.point_value > 5_000_000.0);
    assert!(estimate.point_value < 9_500_000.0);
    assert_eq!(estimate.confidence_band, ConfidenceBand::Good);
}

#[tokio::test]
async fn test_advise_falls_back_to_secondary_model() {
    let client = GenClient::Mock(MockBackend::failing(&["gemini-1.5-flash"]));
    let pipeline = pipeline_with(client);

    let request = EstimateRequest {
        target_units: 150,
        target_rating: 4.6,
        target_genre: Some("Fiction".to_string()),
    };
    let (estimate, insight) = pipeline.advise(&request).await.unwrap();

    assert_eq!(estimate.confidence_band, ConfidenceBand::Excellent);
    assert!(insight.generated);
    assert!(insight.narrative.contains("gemini-1.5-flash-latest"));
}

#[tokio::test]
async fn test_advise_survives_chain_exhaustion() {
    let client = GenClient::Mock(MockBackend::failing(&[
        "gemini-1.5-flash",
        "gemini-1.5-flash-latest",
    ]));
    let pipeline = pipeline_with(client);

    let request = EstimateRequest {
        target_units: 150,
        target_rating: 3.0,
        target_genre: None,
    };
    let (estimate, insight) = pipeline.advise(&request).await.unwrap();

    // The numeric estimate stands even with no narrative
    assert!(estimate.point_value >= 0.0);
    assert_eq!(estimate.confidence_band, ConfidenceBand::AtRisk);
    assert!(!insight.generated);
    assert!(!insight.narrative.is_empty());
}

#[tokio::test]
async fn test_estimate_rejects_degenerate_dataset() {
    // Two identical rows collapse to one distinct observation
    let rows: Vec<RawRow> = (0..2)
        .map(|_| {
            json!({
                "genre": "Fiction",
                "units_sold": 100,
                "book_average_rating": 4.0,
                "publisher_revenue": 5_000_000.0
            })
            .as_object()
            .unwrap()
            .clone()
        })
        .collect();

    let pipeline = Pipeline::with_parts(
        StoreClient::memory(rows),
        GenClient::mock(),
        test_config(),
    );

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
async fn test_csv_import_reaches_dashboard() {
    let pipeline = pipeline_with(GenClient::mock());

    let csv = "title,genre,units_sold,rating,gross_sale,transaction_date\n\
Dilan,Romance,500,\"4,1\",2000000,2024-03-01";
    let records = parse_csv(csv.as_bytes()).unwrap();
    assert_eq!(records.len(), 1);

    let inserted = pipeline.import_records(&records).await.unwrap();
    assert_eq!(inserted, 1);

    let data = pipeline.dashboard(&FilterSpec::all()).await.unwrap();
    assert_eq!(data.kpis.record_count, 3);
    assert!(data
        .units_by_genre
        .iter()
        .any(|(genre, units)| genre == "Romance" && *units == 500));
}

#[tokio::test]
async fn test_dashboard_is_deterministic() {
    let pipeline = pipeline_with(GenClient::mock());

    let spec = FilterSpec::all().with_min_rating(4.0);
    let first = pipeline.dashboard(&spec).await.unwrap();
    let second = pipeline.dashboard(&spec).await.unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
