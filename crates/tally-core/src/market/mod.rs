//! Market data providers
//!
//! The analyzers never talk to a data vendor directly. They go through the
//! `MarketDataProvider` trait, and every response is validated here before
//! it reaches them.
//!
//! # Architecture
//!
//! - `MarketDataProvider` trait: company info, fundamentals, price history
//! - `MarketDataClient` enum: Clone + dispatch + ingestion validation
//! - Providers: `HttpMarketData` (JSON over HTTP), `FixtureMarketData`
//!   (snapshot files on disk), `MockMarketData` (in memory)
//!
//! Requests are single-shot. A failure is reported for that symbol only.

mod fixture;
mod http;
mod mock;
pub mod symbols;
mod types;

pub use fixture::{FixtureMarketData, SymbolSnapshot};
pub use http::HttpMarketData;
pub use mock::MockMarketData;
pub use symbols::{is_valid_symbol, load_symbols, normalize_all, normalize_symbol};
pub use types::{CompanyInfo, Fundamentals, PriceBar};

use async_trait::async_trait;
use tracing::warn;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{ConfigError, Error, Result};

/// Interface for a market data source
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Company profile for a provider-form symbol (`INFY.NS`)
    async fn company_info(&self, symbol: &str) -> Result<CompanyInfo>;

    /// Latest financial ratios
    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals>;

    /// Daily bars covering roughly the last `days` calendar days
    async fn price_history(&self, symbol: &str, days: u32) -> Result<Vec<PriceBar>>;

    /// Provider name (for logging)
    fn name(&self) -> &str;
}

/// Concrete market data client
///
/// Responses from any provider pass through the ingestion checks below, so
/// analyzers can rely on matching symbols, finite prices and sorted bars.
#[derive(Clone)]
pub enum MarketDataClient {
    Http(HttpMarketData),
    Fixture(FixtureMarketData),
    Mock(MockMarketData),
}

impl MarketDataClient {
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        match config.kind {
            ProviderKind::Http => {
                let base_url = config
                    .base_url
                    .as_deref()
                    .ok_or(ConfigError::MissingSetting("provider.base_url"))?;
                let api_key = std::env::var(&config.api_key_env).ok();
                Ok(MarketDataClient::Http(HttpMarketData::new(
                    base_url,
                    api_key,
                    config.timeout(),
                )?))
            }
            ProviderKind::Fixture => {
                let dir = config
                    .fixture_dir
                    .as_deref()
                    .ok_or(ConfigError::MissingSetting("provider.fixture_dir"))?;
                Ok(MarketDataClient::Fixture(FixtureMarketData::new(dir)))
            }
            ProviderKind::Mock => Ok(MarketDataClient::Mock(MockMarketData::synthetic())),
        }
    }
}

#[async_trait]
impl MarketDataProvider for MarketDataClient {
    async fn company_info(&self, symbol: &str) -> Result<CompanyInfo> {
        let info = match self {
            MarketDataClient::Http(p) => p.company_info(symbol).await,
            MarketDataClient::Fixture(p) => p.company_info(symbol).await,
            MarketDataClient::Mock(p) => p.company_info(symbol).await,
        }?;
        validate_company(symbol, info)
    }

    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals> {
        let data = match self {
            MarketDataClient::Http(p) => p.fundamentals(symbol).await,
            MarketDataClient::Fixture(p) => p.fundamentals(symbol).await,
            MarketDataClient::Mock(p) => p.fundamentals(symbol).await,
        }?;
        validate_fundamentals(symbol, data)
    }

    async fn price_history(&self, symbol: &str, days: u32) -> Result<Vec<PriceBar>> {
        let bars = match self {
            MarketDataClient::Http(p) => p.price_history(symbol, days).await,
            MarketDataClient::Fixture(p) => p.price_history(symbol, days).await,
            MarketDataClient::Mock(p) => p.price_history(symbol, days).await,
        }?;
        validate_history(symbol, bars)
    }

    fn name(&self) -> &str {
        match self {
            MarketDataClient::Http(p) => p.name(),
            MarketDataClient::Fixture(p) => p.name(),
            MarketDataClient::Mock(p) => p.name(),
        }
    }
}

// ============================================================================
// Ingestion checks
// ============================================================================

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn price(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

fn check_symbol(requested: &str, returned: &str) -> Result<()> {
    if returned.is_empty() || symbols::base_symbol(returned) == symbols::base_symbol(requested) {
        return Ok(());
    }
    Err(Error::InvalidData(format!(
        "provider answered {} for {}",
        returned, requested
    )))
}

/// Company info with the symbol pinned and bad numbers dropped
pub fn validate_company(requested: &str, mut info: CompanyInfo) -> Result<CompanyInfo> {
    check_symbol(requested, &info.symbol)?;
    info.symbol = requested.to_string();

    info.market_cap = price(info.market_cap);
    info.current_price = price(info.current_price);
    info.promoter_holding = finite(info.promoter_holding);
    info.institutional_holding = finite(info.institutional_holding);
    info.shares_outstanding = price(info.shares_outstanding);
    info.float_shares = price(info.float_shares);
    info.governance_risk = finite(info.governance_risk);
    info.business_summary = info.business_summary.filter(|s| !s.trim().is_empty());

    if info.name.is_none() && info.market_cap.is_none() && info.current_price.is_none() {
        return Err(Error::data_unavailable(requested, "empty company profile"));
    }
    Ok(info)
}

pub fn validate_fundamentals(requested: &str, mut data: Fundamentals) -> Result<Fundamentals> {
    check_symbol(requested, &data.symbol)?;
    data.symbol = requested.to_string();

    let fields = [
        &mut data.trailing_pe,
        &mut data.forward_pe,
        &mut data.price_to_book,
        &mut data.return_on_equity,
        &mut data.return_on_assets,
        &mut data.profit_margin,
        &mut data.current_ratio,
        &mut data.quick_ratio,
        &mut data.debt_to_equity,
        &mut data.revenue_growth,
        &mut data.earnings_growth,
        &mut data.total_revenue,
        &mut data.operating_cash_flow,
        &mut data.free_cash_flow,
        &mut data.dividend_yield,
        &mut data.beta,
    ];
    let mut present = 0;
    for field in fields {
        *field = finite(*field);
        if field.is_some() {
            present += 1;
        }
    }

    if present == 0 {
        return Err(Error::data_unavailable(requested, "no fundamental data"));
    }
    Ok(data)
}

/// Drop unusable bars and sort the rest by date
pub fn validate_history(requested: &str, bars: Vec<PriceBar>) -> Result<Vec<PriceBar>> {
    let received = bars.len();
    let mut bars: Vec<PriceBar> = bars
        .into_iter()
        .filter(|bar| bar.close.is_finite() && bar.close >= 0.0)
        .map(|mut bar| {
            bar.open = price(bar.open);
            bar.high = price(bar.high);
            bar.low = price(bar.low);
            bar.volume = price(bar.volume);
            bar
        })
        .collect();

    if bars.len() < received {
        warn!(
            symbol = requested,
            dropped = received - bars.len(),
            "Dropped price bars with invalid close"
        );
    }
    if bars.is_empty() {
        return Err(Error::data_unavailable(requested, "no price history"));
    }

    bars.sort_by_key(|bar| bar.date);
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_company_symbol_mismatch_rejected() {
        let info = CompanyInfo {
            symbol: "TCS.NS".into(),
            name: Some("Tata".into()),
            ..Default::default()
        };
        assert!(matches!(
            validate_company("INFY.NS", info),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_company_bad_numbers_dropped() {
        let info = CompanyInfo {
            symbol: "INFY".into(),
            name: Some("Infosys".into()),
            current_price: Some(f64::NAN),
            market_cap: Some(-5.0),
            business_summary: Some("   ".into()),
            ..Default::default()
        };
        let info = validate_company("INFY.NS", info).unwrap();
        assert_eq!(info.symbol, "INFY.NS");
        assert_eq!(info.current_price, None);
        assert_eq!(info.market_cap, None);
        assert_eq!(info.business_summary, None);
    }

    #[test]
    fn test_empty_company_is_unavailable() {
        let err = validate_company("INFY.NS", CompanyInfo::default()).unwrap_err();
        assert!(matches!(err, Error::DataUnavailable { symbol, .. } if symbol == "INFY.NS"));
    }

    #[test]
    fn test_empty_fundamentals_is_unavailable() {
        let data = Fundamentals {
            trailing_pe: Some(f64::INFINITY),
            ..Default::default()
        };
        assert!(matches!(
            validate_fundamentals("X", data),
            Err(Error::DataUnavailable { .. })
        ));
    }

    #[test]
    fn test_history_sorted_and_filtered() {
        let bars = vec![
            PriceBar::new(day(3), 12.0, 100.0),
            PriceBar::new(day(1), 10.0, 100.0),
            PriceBar::new(day(2), f64::NAN, 100.0),
            PriceBar::new(day(4), -1.0, 100.0),
        ];
        let bars = validate_history("X", bars).unwrap();
        let dates: Vec<_> = bars.iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![day(1), day(3)]);
    }

    #[test]
    fn test_empty_history_is_unavailable() {
        assert!(matches!(
            validate_history("X", Vec::new()),
            Err(Error::DataUnavailable { .. })
        ));
    }

    #[test]
    fn test_from_config_requires_base_url() {
        let config = ProviderConfig::default();
        assert!(matches!(
            MarketDataClient::from_config(&config),
            Err(Error::Config(ConfigError::MissingSetting("provider.base_url")))
        ));

        let config = ProviderConfig {
            kind: ProviderKind::Mock,
            ..Default::default()
        };
        assert_eq!(MarketDataClient::from_config(&config).unwrap().name(), "mock");
    }
}
