//! Provider result types
//!
//! Every field besides the symbol is optional: providers routinely leave
//! gaps, and the analyzers treat a missing value as "no evidence" rather
//! than as zero. Percentages are carried as percent (12.5 means 12.5%),
//! ratios as plain ratios (0.45 D/E), money in the listing currency.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Company profile as reported by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyInfo {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub current_price: Option<f64>,
    pub business_summary: Option<String>,
    pub website: Option<String>,
    pub employees: Option<u64>,
    pub country: Option<String>,
    /// Insider/promoter holding, percent
    pub promoter_holding: Option<f64>,
    /// Institutional holding, percent
    pub institutional_holding: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub float_shares: Option<f64>,
    /// Governance risk on a 1-10 scale (10 is worst)
    pub governance_risk: Option<f64>,
}

/// Financial ratios and statement figures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fundamentals {
    pub symbol: String,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
    pub profit_margin: Option<f64>,
    pub current_ratio: Option<f64>,
    pub quick_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    /// Year-over-year revenue growth, percent
    pub revenue_growth: Option<f64>,
    /// Year-over-year earnings growth, percent
    pub earnings_growth: Option<f64>,
    pub total_revenue: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
}

/// One daily bar. Only the date and close are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
}

impl PriceBar {
    pub fn new(date: NaiveDate, close: f64, volume: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: Some(volume),
        }
    }
}
