//! Pluggable text-generation backend abstraction
//!
//! This module provides a backend-agnostic interface for the one network
//! boundary of the pipeline: submit a text prompt to a generation service,
//! receive text. Model selection and the fallback chain live one level up
//! in [`crate::insight`]; backends only know how to call one model.
//!
//! # Architecture
//!
//! - `GenBackend` trait: defines the interface for generation calls
//! - `GenClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `MockBackend`

mod gemini;
mod mock;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;

use std::time::Duration;

use async_trait::async_trait;

use crate::config::GenOptions;
use crate::error::Result;

/// Trait defining the interface for generation backends
///
/// Backends must be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait GenBackend: Send + Sync {
    /// Submit a prompt to one model and return the generated text.
    ///
    /// A rejected model identifier surfaces as an error here so the
    /// caller's fallback chain can try the next identifier.
    async fn generate(&self, model_id: &str, prompt: &str, options: &GenOptions)
        -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete generation client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum GenClient {
    /// Gemini backend (HTTP API)
    Gemini(GeminiBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl GenClient {
    /// Create a Gemini backend directly
    pub fn gemini(api_key: &str, timeout: Duration) -> Self {
        GenClient::Gemini(GeminiBackend::new(api_key, timeout))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        GenClient::Mock(MockBackend::new())
    }
}

#[async_trait]
impl GenBackend for GenClient {
    async fn generate(
        &self,
        model_id: &str,
        prompt: &str,
        options: &GenOptions,
    ) -> Result<String> {
        match self {
            GenClient::Gemini(b) => b.generate(model_id, prompt, options).await,
            GenClient::Mock(b) => b.generate(model_id, prompt, options).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            GenClient::Gemini(b) => b.health_check().await,
            GenClient::Mock(b) => b.health_check().await,
        }
    }

    fn host(&self) -> &str {
        match self {
            GenClient::Gemini(b) => b.host(),
            GenClient::Mock(b) => b.host(),
        }
    }
}
