//! CLI command implementations
//!
//! Each submodule contains related command implementations:
//! - `analyze`: Batch stock scoring with reports
//! - `receipt`: OCR text parsing and ledger recording
//! - `sample`: Deterministic sample calendars and charts
//! - `serve`: Web server

pub mod analyze;
pub mod receipt;
pub mod sample;
pub mod serve;

pub use analyze::*;
pub use receipt::*;
pub use sample::*;
pub use serve::*;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tally_core::{AppConfig, CsvLedger};

/// Truncate a string to max length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Open the CSV ledger named by the override or `ledger.path`
pub fn open_ledger(config: &AppConfig, path: Option<PathBuf>) -> Result<CsvLedger> {
    let path = path
        .or_else(|| config.ledger.path.clone())
        .context("No ledger file configured. Pass --ledger or set ledger.path")?;
    CsvLedger::open(path.clone(), config.ledger.principal)
        .with_context(|| format!("Failed to open ledger {}", path.display()))
}
