//! Pipeline configuration
//!
//! Configuration is assembled once at process start and passed into each
//! component by reference; components never reach into ambient global state.
//!
//! Credentials come from environment variables and are fatal when missing
//! (there is no partial operation mode):
//! - `SUPABASE_URL` / `SUPABASE_KEY`: record store endpoint and access key
//! - `SUPABASE_TABLE`: sales table name (default: penjualan_buku)
//! - `GEMINI_API_KEY`: generation-service key
//!
//! The generation model chain and tuning knobs are loaded with a two-layer
//! resolution:
//! 1. Check for an override in the data dir (~/.local/share/bookdash/config/models.toml)
//! 2. Fall back to embedded defaults (compiled into the binary)

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/models.toml");

/// Record store connection settings
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Supabase project URL
    pub url: String,
    /// Service/anon API key
    pub key: String,
    /// Table holding the sales rows
    pub table: String,
}

/// Sampling options forwarded to the generation service
#[derive(Debug, Clone, Copy)]
pub struct GenOptions {
    pub temperature: f64,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            max_output_tokens: 512,
        }
    }
}

/// Generation model chain and pipeline tuning
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Ordered fallback chain of model identifiers; first success wins
    pub models: Vec<String>,
    /// Per-request timeout applied to generation and store HTTP calls
    pub timeout: Duration,
    /// Sampling options for every call in the chain
    pub options: GenOptions,
    /// Time-to-live of the dataset snapshot cache
    pub snapshot_ttl: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            models: vec![
                "gemini-1.5-flash".to_string(),
                "gemini-1.5-flash-latest".to_string(),
            ],
            timeout: Duration::from_secs(30),
            options: GenOptions::default(),
            snapshot_ttl: Duration::from_secs(600),
        }
    }
}

/// Full application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreConfig,
    /// Generation-service API key
    pub gemini_api_key: String,
    pub chain: ChainConfig,
}

impl AppConfig {
    /// Build the configuration from the environment, failing fast on
    /// missing credentials.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Tests inject fixed maps
    /// here instead of mutating the process environment.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url = lookup("SUPABASE_URL").filter(|s| !s.is_empty());
        let key = lookup("SUPABASE_KEY").filter(|s| !s.is_empty());

        let (url, key) = match (url, key) {
            (Some(url), Some(key)) => (url, key),
            _ => {
                return Err(Error::Config(
                    "SUPABASE_URL and SUPABASE_KEY must be set".to_string(),
                ))
            }
        };

        let gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Config("GEMINI_API_KEY must be set".to_string()))?;

        let table = lookup("SUPABASE_TABLE").unwrap_or_else(|| "penjualan_buku".to_string());

        Ok(Self {
            store: StoreConfig {
                url: url.trim_end_matches('/').to_string(),
                key,
                table,
            },
            gemini_api_key,
            chain: load_chain_config(None)?,
        })
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("bookdash").join("config").join("models.toml"))
}

/// Load the chain configuration (override first, then embedded default)
pub fn load_chain_config(override_path: Option<&PathBuf>) -> Result<ChainConfig> {
    let content = if let Some(path) = override_path {
        if path.exists() {
            fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
        } else {
            DEFAULT_CONFIG.to_string()
        }
    } else if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            fs::read_to_string(&default_path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
        } else {
            DEFAULT_CONFIG.to_string()
        }
    } else {
        DEFAULT_CONFIG.to_string()
    };

    parse_chain_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    defaults: Option<RawDefaults>,
    generation: Option<RawGeneration>,
    cache: Option<RawCache>,
}

#[derive(Debug, Deserialize)]
struct RawDefaults {
    models: Option<Vec<String>>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawGeneration {
    temperature: Option<f64>,
    top_p: Option<f64>,
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawCache {
    snapshot_ttl_secs: Option<u64>,
}

/// Parse the chain config from TOML content
fn parse_chain_config(content: &str) -> Result<ChainConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = ChainConfig::default();

    if let Some(defaults) = raw.defaults {
        if let Some(models) = defaults.models {
            if models.is_empty() {
                return Err(Error::Config(
                    "Model chain must contain at least one model id".to_string(),
                ));
            }
            config.models = models;
        }
        if let Some(timeout) = defaults.timeout_secs {
            config.timeout = Duration::from_secs(timeout);
        }
    }

    if let Some(generation) = raw.generation {
        if let Some(temperature) = generation.temperature {
            config.options.temperature = temperature;
        }
        if let Some(top_p) = generation.top_p {
            config.options.top_p = top_p;
        }
        if let Some(max_tokens) = generation.max_output_tokens {
            config.options.max_output_tokens = max_tokens;
        }
    }

    if let Some(cache) = raw.cache {
        if let Some(ttl) = cache.snapshot_ttl_secs {
            config.snapshot_ttl = Duration::from_secs(ttl);
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_config() {
        let config = parse_chain_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.models[0], "gemini-1.5-flash");
        assert_eq!(config.snapshot_ttl, Duration::from_secs(600));
    }

    #[test]
    fn test_parse_override() {
        let content = r#"
[defaults]
models = ["custom-model"]
timeout_secs = 5

[cache]
snapshot_ttl_secs = 60
"#;
        let config = parse_chain_config(content).unwrap();
        assert_eq!(config.models, vec!["custom-model".to_string()]);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.snapshot_ttl, Duration::from_secs(60));
        // Generation knobs keep their defaults
        assert_eq!(config.options.max_output_tokens, 512);
    }

    #[test]
    fn test_empty_chain_rejected() {
        let content = r#"
[defaults]
models = []
"#;
        assert!(parse_chain_config(content).is_err());
    }

    #[test]
    fn test_load_chain_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.toml");
        std::fs::write(&path, "[defaults]\nmodels = [\"file-model\"]\n").unwrap();

        let config = load_chain_config(Some(&path)).unwrap();
        assert_eq!(config.models, vec!["file-model".to_string()]);
    }

    #[test]
    fn test_load_chain_config_missing_file_uses_default() {
        let path = PathBuf::from("/nonexistent/models.toml");
        let config = load_chain_config(Some(&path)).unwrap();
        assert_eq!(config.models[0], "gemini-1.5-flash");
    }

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_missing_supabase_url_is_fatal() {
        let result = AppConfig::from_lookup(vars(&[
            ("SUPABASE_KEY", "key"),
            ("GEMINI_API_KEY", "gkey"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_supabase_key_is_fatal() {
        let result = AppConfig::from_lookup(vars(&[
            ("SUPABASE_URL", "https://example.supabase.co"),
            ("GEMINI_API_KEY", "gkey"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_gemini_key_is_fatal() {
        let result = AppConfig::from_lookup(vars(&[
            ("SUPABASE_URL", "https://example.supabase.co"),
            ("SUPABASE_KEY", "key"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_credential_is_fatal() {
        let result = AppConfig::from_lookup(vars(&[
            ("SUPABASE_URL", ""),
            ("SUPABASE_KEY", "key"),
            ("GEMINI_API_KEY", "gkey"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_complete_credentials_load() {
        let config = AppConfig::from_lookup(vars(&[
            ("SUPABASE_URL", "https://example.supabase.co/"),
            ("SUPABASE_KEY", "key"),
            ("GEMINI_API_KEY", "gkey"),
        ]))
        .unwrap();
        assert_eq!(config.store.url, "https://example.supabase.co");
        assert_eq!(config.store.table, "penjualan_buku");
        assert_eq!(config.gemini_api_key, "gkey");
    }
}
