//! Error types for Tally

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    pub fn data_unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

/// Receipt text that could not be turned into an expense record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("receipt text is empty")]
    EmptyText,

    #[error("no total amount found in receipt text")]
    NoTotalFound,
}

/// Invalid configuration values. Always fatal at startup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("scoring weights must sum to 100, got {sum}")]
    WeightsNotNormalized { sum: f64 },

    #[error("scoring weight `{name}` must be a non-negative number, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("price range min ({min}) must be non-negative and not above max ({max})")]
    InvalidPriceRange { min: f64, max: f64 },

    #[error("indicator window `{name}` must be at least {min}, got {value}")]
    InvalidWindow {
        name: &'static str,
        value: usize,
        min: usize,
    },

    #[error("MACD fast period ({fast}) must be shorter than slow period ({slow})")]
    InvalidMacd { fast: usize, slow: usize },

    #[error("sample percent range must satisfy 0 <= min < max <= 100, got {min}..{max}")]
    InvalidPercentRange { min: f64, max: f64 },

    #[error("analysis concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("ledger principal must be positive")]
    InvalidPrincipal,

    #[error("missing required setting `{0}`")]
    MissingSetting(&'static str),

    #[error("invalid config TOML: {0}")]
    Malformed(String),

    #[error("failed to read config {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
