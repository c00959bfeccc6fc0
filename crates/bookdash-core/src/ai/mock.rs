//! Mock backend for testing
//!
//! Returns a deterministic canned narrative, and can be configured to
//! reject specific model identifiers to exercise the fallback chain.

use async_trait::async_trait;

use crate::config::GenOptions;
use crate::error::{Error, Result};

use super::GenBackend;

/// Mock generation backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Model identifiers that fail with an error
    pub failing_models: Vec<String>,
}

impl MockBackend {
    /// Create a new mock backend (healthy, all models succeed)
    pub fn new() -> Self {
        Self {
            healthy: true,
            failing_models: Vec::new(),
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            failing_models: Vec::new(),
        }
    }

    /// Reject the given model identifiers
    pub fn failing(models: &[&str]) -> Self {
        Self {
            healthy: true,
            failing_models: models.iter().map(|m| m.to_string()).collect(),
        }
    }
}

#[async_trait]
impl GenBackend for MockBackend {
    async fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        _options: &GenOptions,
    ) -> Result<String> {
        if !self.healthy || self.failing_models.iter().any(|m| m == model_id) {
            return Err(Error::Insight(format!("model {} rejected", model_id)));
        }

        Ok(format!(
            "Mock advice from {}: based on the provided figures ({} prompt chars), \
             the projection looks consistent with the historical data.",
            model_id,
            prompt.len()
        ))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
