//! Record store adapter
//!
//! The store is an opaque remote table with select/insert semantics; table
//! identity and schema are caller-supplied configuration. The production
//! backend speaks Supabase's PostgREST API. Failures are split along the
//! error taxonomy so callers can distinguish "store unreachable" from
//! "malformed data": transport errors map to `Error::Store`, bodies that
//! are not an array of JSON objects map to `Error::MalformedResponse`.
//!
//! Store calls are made with zero retries; the pipeline surfaces the
//! failure instead.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{NewSalesRecord, RawRow};

/// Trait defining the record store interface
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch every row of the table as untyped column/value mappings
    async fn select_all(&self, table: &str) -> Result<Vec<RawRow>>;

    /// Insert one new record
    async fn insert(&self, table: &str, record: &NewSalesRecord) -> Result<()>;

    /// Check if the store is reachable
    async fn health_check(&self) -> bool;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete store client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum StoreClient {
    /// Supabase PostgREST backend
    Supabase(SupabaseStore),
    /// In-memory store for testing
    Memory(MemoryStore),
}

impl StoreClient {
    pub fn supabase(url: &str, key: &str, timeout: Duration) -> Self {
        StoreClient::Supabase(SupabaseStore::new(url, key, timeout))
    }

    pub fn memory(rows: Vec<RawRow>) -> Self {
        StoreClient::Memory(MemoryStore::new(rows))
    }
}

#[async_trait]
impl RecordStore for StoreClient {
    async fn select_all(&self, table: &str) -> Result<Vec<RawRow>> {
        match self {
            StoreClient::Supabase(s) => s.select_all(table).await,
            StoreClient::Memory(s) => s.select_all(table).await,
        }
    }

    async fn insert(&self, table: &str, record: &NewSalesRecord) -> Result<()> {
        match self {
            StoreClient::Supabase(s) => s.insert(table, record).await,
            StoreClient::Memory(s) => s.insert(table, record).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            StoreClient::Supabase(s) => s.health_check().await,
            StoreClient::Memory(s) => s.health_check().await,
        }
    }

    fn host(&self) -> &str {
        match self {
            StoreClient::Supabase(s) => s.host(),
            StoreClient::Memory(s) => s.host(),
        }
    }
}

/// Supabase PostgREST store backend
#[derive(Clone)]
pub struct SupabaseStore {
    http_client: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl RecordStore for SupabaseStore {
    async fn select_all(&self, table: &str) -> Result<Vec<RawRow>> {
        let url = format!("{}/rest/v1/{}?select=*", self.base_url, table);

        let response = self
            .http_client
            .get(&url)
            .timeout(self.timeout)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Store(format!(
                "select from {} failed with status {}",
                table,
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::MalformedResponse(e.to_string()))?;

        let rows = body
            .as_array()
            .ok_or_else(|| Error::MalformedResponse("expected a JSON array of rows".to_string()))?
            .iter()
            .map(|row| {
                row.as_object().cloned().ok_or_else(|| {
                    Error::MalformedResponse("row is not a JSON object".to_string())
                })
            })
            .collect::<Result<Vec<RawRow>>>()?;

        debug!(table, rows = rows.len(), "Fetched store rows");
        Ok(rows)
    }

    async fn insert(&self, table: &str, record: &NewSalesRecord) -> Result<()> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);

        let response = self
            .http_client
            .post(&url)
            .timeout(self.timeout)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Store(format!(
                "insert into {} failed with status {}",
                table,
                response.status()
            )));
        }

        debug!(table, "Inserted record");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/rest/v1/", self.base_url);
        match self
            .http_client
            .get(&url)
            .timeout(self.timeout)
            .header("apikey", &self.api_key)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

/// In-memory store for tests
#[derive(Clone, Default)]
pub struct MemoryStore {
    rows: Arc<Mutex<Vec<RawRow>>>,
    /// When set, every call fails as unreachable
    pub fail: bool,
}

impl MemoryStore {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
            fail: false,
        }
    }

    /// A store whose calls all fail as unreachable
    pub fn unreachable() -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn select_all(&self, _table: &str) -> Result<Vec<RawRow>> {
        if self.fail {
            return Err(Error::Store("memory store marked unreachable".to_string()));
        }
        Ok(self
            .rows
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))?
            .clone())
    }

    async fn insert(&self, _table: &str, record: &NewSalesRecord) -> Result<()> {
        if self.fail {
            return Err(Error::Store("memory store marked unreachable".to_string()));
        }
        let value = serde_json::to_value(record)?;
        let row = value
            .as_object()
            .cloned()
            .ok_or_else(|| Error::InvalidData("record did not serialize to an object".into()))?;
        self.rows
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))?
            .push(row);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        !self.fail
    }

    fn host(&self) -> &str {
        "memory://localhost"
    }
}
