//! Application configuration
//!
//! Everything tunable lives in one TOML file: scoring weights, the price-range
//! filter, indicator windows, red-flag thresholds, the market data provider,
//! the expense ledger, and the OCR backend.
//!
//! ## Configuration Resolution
//!
//! 1. An explicit path (`tally -c FILE`) must exist and is used as-is
//! 2. Otherwise the user override (~/.config/tally/config.toml) if present
//! 3. Otherwise the embedded defaults (compiled into binary)
//!
//! Every loaded config is validated; a bad value is a [`ConfigError`] and the
//! caller is expected to abort.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::scoring::ScoringWeights;

/// Embedded default config (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Full application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub scoring_weights: ScoringWeights,
    pub price_range: PriceRange,
    pub technical_indicators: TechnicalConfig,
    pub risk_flags: RiskFlagConfig,
    pub fundamental_thresholds: FundamentalThresholds,
    pub market: MarketConfig,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
    pub provider: ProviderConfig,
    pub ledger: LedgerConfig,
    pub sample: SampleConfig,
    pub investments: InvestmentsConfig,
    pub ocr: OcrConfig,
}

/// Acceptable share price window for the eligibility gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self { min: 1.0, max: 100.0 }
    }
}

impl PriceRange {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

/// Indicator windows, in trading days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalConfig {
    pub moving_averages: Vec<usize>,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger_period: usize,
    pub bollinger_std: f64,
}

impl Default for TechnicalConfig {
    fn default() -> Self {
        Self {
            moving_averages: vec![20, 50, 200],
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger_period: 20,
            bollinger_std: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskFlagConfig {
    /// Promoter (insider) holding below this percentage is a red flag
    pub min_promoter_holding: f64,
    /// 30-day average volume below this marks a stock illiquid
    pub min_trading_volume: f64,
}

impl Default for RiskFlagConfig {
    fn default() -> Self {
        Self {
            min_promoter_holding: 30.0,
            min_trading_volume: 10_000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundamentalThresholds {
    pub min_market_cap: f64,
}

impl Default for FundamentalThresholds {
    fn default() -> Self {
        Self {
            min_market_cap: 50_000_000.0,
        }
    }
}

/// Exchange suffix appended to bare symbols before hitting the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Exchange {
    #[default]
    #[serde(rename = "NSE")]
    Nse,
    #[serde(rename = "BSE")]
    Bse,
    /// No suffix (US-style tickers)
    #[serde(rename = "NONE")]
    Plain,
}

impl Exchange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nse => "NSE",
            Self::Bse => "BSE",
            Self::Plain => "NONE",
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Nse => ".NS",
            Self::Bse => ".BO",
            Self::Plain => "",
        }
    }
}

impl std::str::FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NSE" => Ok(Self::Nse),
            "BSE" => Ok(Self::Bse),
            "NONE" | "" => Ok(Self::Plain),
            _ => Err(format!("Unknown exchange: {}", s)),
        }
    }
}

impl std::fmt::Display for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MarketConfig {
    pub exchange: Exchange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Maximum symbols analyzed at once
    pub concurrency: usize,
    /// Calendar days of price history to request
    pub history_days: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            history_days: 365,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub report_directory: PathBuf,
    /// Log filter used when neither RUST_LOG nor --verbose is given
    pub log_level: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_directory: PathBuf::from("reports"),
            log_level: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Http,
    Fixture,
    Mock,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Fixture => "fixture",
            Self::Mock => "mock",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "fixture" | "fixtures" => Ok(Self::Fixture),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown provider kind: {}", s)),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub base_url: Option<String>,
    /// Name of the env var holding the API key (never the key itself)
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub fixture_dir: Option<PathBuf>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Http,
            base_url: None,
            api_key_env: "TALLY_MARKET_API_KEY".to_string(),
            timeout_secs: 30,
            fixture_dir: None,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Starting balance that expenses are deducted from
    pub principal: Decimal,
    /// CSV ledger file; in-memory when unset
    pub path: Option<PathBuf>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            principal: Decimal::new(10_000, 0),
            path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleConfig {
    pub percent_min: f64,
    pub percent_max: f64,
    pub default_seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            percent_min: 20.0,
            percent_max: 80.0,
            default_seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestmentsConfig {
    /// Symbols the balance is split across for `/investments/recommend`
    pub watchlist: Vec<String>,
    /// Suffix applied to the watchlist, independent of `market.exchange`
    pub exchange: Exchange,
}

impl Default for InvestmentsConfig {
    fn default() -> Self {
        Self {
            watchlist: ["AAPL", "MSFT", "GOOGL", "AMZN"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exchange: Exchange::Plain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackendKind {
    #[default]
    Tesseract,
    Ollama,
    Mock,
}

impl OcrBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tesseract => "tesseract",
            Self::Ollama => "ollama",
            Self::Mock => "mock",
        }
    }
}

impl std::str::FromStr for OcrBackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tesseract" => Ok(Self::Tesseract),
            "ollama" => Ok(Self::Ollama),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown OCR backend: {}", s)),
        }
    }
}

impl std::fmt::Display for OcrBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub backend: OcrBackendKind,
    pub tesseract_cmd: String,
    pub ollama_model: String,
    pub timeout_secs: u64,
    /// Unparseable receipts kept for manual review (oldest evicted first)
    pub review_capacity: usize,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackendKind::Tesseract,
            tesseract_cmd: "tesseract".to_string(),
            ollama_model: "llama3.2-vision".to_string(),
            timeout_secs: 30,
            review_capacity: 100,
        }
    }
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Load configuration following the resolution order in the module docs
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let content = match explicit {
            Some(path) => read_config(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => read_config(&path)?,
                _ => DEFAULT_CONFIG.to_string(),
            },
        };

        Self::from_toml(&content)
    }

    /// Parse and validate config from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every invariant the rest of the crate relies on
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.scoring_weights.validate()?;

        let range = &self.price_range;
        if !range.min.is_finite() || !range.max.is_finite() || range.min < 0.0 || range.min > range.max
        {
            return Err(ConfigError::InvalidPriceRange {
                min: range.min,
                max: range.max,
            });
        }

        let tech = &self.technical_indicators;
        for &period in &tech.moving_averages {
            check_window("moving_averages", period, 2)?;
        }
        check_window("rsi_period", tech.rsi_period, 2)?;
        check_window("macd_fast", tech.macd_fast, 2)?;
        check_window("macd_slow", tech.macd_slow, 2)?;
        check_window("macd_signal", tech.macd_signal, 1)?;
        check_window("bollinger_period", tech.bollinger_period, 2)?;
        if tech.macd_fast >= tech.macd_slow {
            return Err(ConfigError::InvalidMacd {
                fast: tech.macd_fast,
                slow: tech.macd_slow,
            });
        }

        let sample = &self.sample;
        if !(0.0..=100.0).contains(&sample.percent_min)
            || !(0.0..=100.0).contains(&sample.percent_max)
            || sample.percent_min >= sample.percent_max
        {
            return Err(ConfigError::InvalidPercentRange {
                min: sample.percent_min,
                max: sample.percent_max,
            });
        }

        if self.analysis.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }

        if self.ledger.principal <= Decimal::ZERO {
            return Err(ConfigError::InvalidPrincipal);
        }

        Ok(())
    }
}

fn check_window(
    name: &'static str,
    value: usize,
    min: usize,
) -> std::result::Result<(), ConfigError> {
    if value < min {
        return Err(ConfigError::InvalidWindow { name, value, min });
    }
    Ok(())
}

fn read_config(path: &Path) -> std::result::Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tally").join("config.toml"))
}
