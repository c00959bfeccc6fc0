//! Error types for Bookdash

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Record store unreachable: {0}")]
    Store(String),

    #[error("Malformed store response: {0}")]
    MalformedResponse(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Insight generation failed: {0}")]
    Insight(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, Error>;
