//! Report output: one JSON file per symbol and a combined score CSV

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;

use crate::analyzer::SymbolAnalysis;
use crate::error::Result;
use crate::market::symbols::base_symbol;
use crate::scoring::ScoreCard;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// `ACME_report_20240630_101500.json`
pub fn report_file_name(symbol: &str, at: NaiveDateTime) -> String {
    format!(
        "{}_report_{}.json",
        base_symbol(symbol),
        at.format(TIMESTAMP_FORMAT)
    )
}

/// `stock_scores_20240630_101500.csv`
pub fn scores_file_name(at: NaiveDateTime) -> String {
    format!("stock_scores_{}.csv", at.format(TIMESTAMP_FORMAT))
}

#[derive(Serialize)]
struct SymbolReport<'a> {
    symbol: &'a str,
    generated_at: String,
    #[serde(flatten)]
    analysis: &'a SymbolAnalysis,
}

/// Write the full analysis for one symbol as pretty JSON into `dir`
pub fn write_symbol_report(dir: &Path, analysis: &SymbolAnalysis) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let now = Local::now().naive_local();
    let symbol = &analysis.score_card.symbol;
    let path = dir.join(report_file_name(symbol, now));

    let report = SymbolReport {
        symbol,
        generated_at: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
        analysis,
    };
    fs::write(&path, serde_json::to_string_pretty(&report)?)?;

    tracing::debug!(symbol = %symbol, path = %path.display(), "Wrote symbol report");
    Ok(path)
}

/// One CSV row per scored symbol
#[derive(Debug, Serialize)]
struct ScoreRow<'a> {
    symbol: &'a str,
    company_name: &'a str,
    overall_score: f64,
    recommendation: &'static str,
    category: &'static str,
    eligibility: &'static str,
    confidence: &'static str,
    risk_level: &'a str,
    current_price: Option<f64>,
    market_cap_category: &'static str,
    profile_score: f64,
    fundamental_score: f64,
    technical_score: f64,
    risk_score: f64,
}

impl<'a> From<&'a ScoreCard> for ScoreRow<'a> {
    fn from(card: &'a ScoreCard) -> Self {
        Self {
            symbol: &card.symbol,
            company_name: &card.company_name,
            overall_score: card.overall_score,
            recommendation: card.recommendation.as_str(),
            category: card.category.as_str(),
            eligibility: card.eligibility.as_str(),
            confidence: card.confidence.as_str(),
            risk_level: &card.risk_level,
            current_price: card.current_price,
            market_cap_category: card.market_cap_category.as_str(),
            profile_score: card.scores.profile,
            fundamental_score: card.scores.fundamental,
            technical_score: card.scores.technical,
            risk_score: card.scores.risk,
        }
    }
}

/// Write the combined score CSV, creating parent directories as needed
pub fn write_scores_csv(path: &Path, cards: &[&ScoreCard]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for card in cards {
        writer.serialize(ScoreRow::from(*card))?;
    }
    writer.flush()?;

    tracing::info!(rows = cards.len(), path = %path.display(), "Wrote score CSV");
    Ok(())
}
