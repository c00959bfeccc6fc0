//! Test utilities for bookdash-core
//!
//! Mock Gemini and Supabase servers for integration tests. Both bind an
//! ephemeral local port and shut down when dropped.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// Mock Gemini generateContent server
///
/// Models listed in `failing` are rejected with a 404, everything else
/// gets a canned candidate naming the model, so tests can assert which
/// link of a fallback chain produced the answer.
pub struct MockGeminiServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

#[derive(Clone, Default)]
struct GeminiState {
    failing: Arc<HashSet<String>>,
}

impl MockGeminiServer {
    /// Start a server where every model succeeds
    pub async fn start() -> Self {
        Self::start_failing(&[]).await
    }

    /// Start a server that rejects the given model ids
    pub async fn start_failing(failing: &[&str]) -> Self {
        let state = GeminiState {
            failing: Arc::new(failing.iter().map(|s| s.to_string()).collect()),
        };

        let app = Router::new()
            .route("/v1beta/models", get(handle_list_models))
            .route("/v1beta/models/:model_call", post(handle_generate))
            .with_state(state);

        let (addr, shutdown_tx) = serve(app).await;
        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockGeminiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_list_models() -> Json<Value> {
    Json(json!({
        "models": [
            {"name": "models/gemini-1.5-flash"},
            {"name": "models/gemini-1.5-flash-latest"}
        ]
    }))
}

async fn handle_generate(
    State(state): State<GeminiState>,
    Path(model_call): Path<String>,
    Json(_request): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    // Path segment is "{model}:generateContent"
    let model = model_call
        .split(':')
        .next()
        .unwrap_or_default()
        .to_string();

    if state.failing.contains(&model) {
        return Err(StatusCode::NOT_FOUND);
    }

    Ok(Json(json!({
        "candidates": [{
            "content": {
                "parts": [{
                    "text": format!("Mock narrative from {}: revenue outlook is steady.", model)
                }]
            }
        }]
    })))
}

/// Mock Supabase PostgREST server backed by an in-process row list
pub struct MockSupabaseServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    rows: Arc<Mutex<Vec<Value>>>,
}

#[derive(Clone)]
struct SupabaseState {
    rows: Arc<Mutex<Vec<Value>>>,
}

impl MockSupabaseServer {
    /// Start with the given seed rows; every table name serves the same rows
    pub async fn start(seed: Vec<Value>) -> Self {
        let rows = Arc::new(Mutex::new(seed));
        let state = SupabaseState { rows: rows.clone() };

        let app = Router::new()
            .route("/rest/v1/", get(|| async { Json(json!({})) }))
            .route(
                "/rest/v1/:table",
                get(handle_select).post(handle_insert),
            )
            .with_state(state);

        let (addr, shutdown_tx) = serve(app).await;
        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            rows,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockSupabaseServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_select(State(state): State<SupabaseState>) -> Json<Value> {
    let rows = state
        .rows
        .lock()
        .map(|r| r.clone())
        .unwrap_or_default();
    Json(Value::Array(rows))
}

async fn handle_insert(
    State(state): State<SupabaseState>,
    Json(row): Json<Value>,
) -> StatusCode {
    if let Ok(mut rows) = state.rows.lock() {
        rows.push(row);
    }
    StatusCode::CREATED
}

/// Bind an ephemeral port and serve the router until the returned sender
/// fires.
async fn serve(app: Router) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .unwrap();
    });

    (addr, shutdown_tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{GenBackend, GeminiBackend};
    use crate::config::GenOptions;
    use crate::store::{RecordStore, SupabaseStore};
    use std::time::Duration;

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_mock_gemini_health_check() {
        let server = MockGeminiServer::start().await;
        let backend = GeminiBackend::with_base_url(&server.url(), "test-key", TEST_TIMEOUT);
        assert!(backend.health_check().await);
    }

    #[tokio::test]
    async fn test_mock_gemini_generate() {
        let server = MockGeminiServer::start().await;
        let backend = GeminiBackend::with_base_url(&server.url(), "test-key", TEST_TIMEOUT);

        let text = backend
            .generate("gemini-1.5-flash", "prompt", &GenOptions::default())
            .await
            .unwrap();
        assert!(text.contains("gemini-1.5-flash"));
    }

    #[tokio::test]
    async fn test_mock_gemini_failing_model() {
        let server = MockGeminiServer::start_failing(&["gemini-1.5-flash"]).await;
        let backend = GeminiBackend::with_base_url(&server.url(), "test-key", TEST_TIMEOUT);

        assert!(backend
            .generate("gemini-1.5-flash", "prompt", &GenOptions::default())
            .await
            .is_err());
        assert!(backend
            .generate("gemini-1.5-flash-latest", "prompt", &GenOptions::default())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_mock_supabase_select_and_insert() {
        let server = MockSupabaseServer::start(vec![json!({"units_sold": 10})]).await;
        let store = SupabaseStore::new(&server.url(), "test-key", TEST_TIMEOUT);

        let rows = store.select_all("penjualan_buku").await.unwrap();
        assert_eq!(rows.len(), 1);

        let record = crate::models::NewSalesRecord {
            title: Some("X".to_string()),
            author: None,
            genre: "Fiction".to_string(),
            publisher: None,
            units_sold: 5,
            average_rating: 4.0,
            gross_revenue: 50.0,
            transaction_date: None,
            import_hash: None,
        };
        store.insert("penjualan_buku", &record).await.unwrap();
        assert_eq!(server.row_count(), 2);

        assert!(store.health_check().await);
    }

    #[tokio::test]
    async fn test_generate_times_out_on_stalled_server() {
        let app = Router::new().route(
            "/v1beta/models/:model_call",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({"candidates": []}))
            }),
        );
        let (addr, shutdown_tx) = serve(app).await;

        let backend = GeminiBackend::with_base_url(
            &format!("http://{}", addr),
            "test-key",
            Duration::from_millis(100),
        );
        let result = backend
            .generate("gemini-1.5-flash", "prompt", &GenOptions::default())
            .await;
        assert!(result.is_err());

        let _ = shutdown_tx.send(());
    }
}
