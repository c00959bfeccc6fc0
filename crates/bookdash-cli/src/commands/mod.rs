//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `estimate` - Revenue estimation and narrative advice
//! - `import` - CSV import command
//! - `records` - Sales record commands (list, add)
//! - `report` - Dashboard report commands
//! - `status` - Store/generation reachability command

pub mod estimate;
pub mod import;
pub mod records;
pub mod report;
pub mod status;

// Re-export command functions for main.rs
pub use estimate::*;
pub use import::*;
pub use records::*;
pub use report::*;
pub use status::*;

use std::path::Path;

use anyhow::{Context, Result};
use bookdash_core::{config, AppConfig, Pipeline};
use tracing::debug;

/// Build the pipeline from the environment, with an optional models.toml
/// override path.
pub fn build_pipeline(config_path: Option<&Path>) -> Result<Pipeline> {
    let mut app_config = AppConfig::from_env().context(
        "Missing credentials. Set SUPABASE_URL, SUPABASE_KEY and GEMINI_API_KEY.",
    )?;

    if let Some(path) = config_path {
        app_config.chain = config::load_chain_config(Some(&path.to_path_buf()))
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
    }

    debug!(
        table = %app_config.store.table,
        models = ?app_config.chain.models,
        "Pipeline configured"
    );
    Ok(Pipeline::new(app_config))
}

/// Truncate a string to a maximum byte length, adding "..." if truncated.
/// The cut is walked back to a char boundary so multibyte titles slice
/// cleanly.
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max.saturating_sub(3);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

/// Format a revenue value with thousands separators
pub fn format_money(value: f64) -> String {
    let whole = value.round() as i64;
    let mut out = String::new();
    let digits = whole.abs().to_string();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if whole < 0 {
        format!("-{}", out)
    } else {
        out
    }
}
