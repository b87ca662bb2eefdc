//! In-memory market data for tests and demo runs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};

use crate::error::{Error, Result};
use crate::sample::SampleRng;

use super::symbols::base_symbol;
use super::{CompanyInfo, Fundamentals, MarketDataProvider, PriceBar, SymbolSnapshot};

/// Serves registered snapshots, or synthesizes one per symbol when built
/// with [`MockMarketData::synthetic`]
#[derive(Clone, Default)]
pub struct MockMarketData {
    snapshots: Arc<HashMap<String, SymbolSnapshot>>,
    synthetic: bool,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Data generated deterministically from the symbol name
    pub fn synthetic() -> Self {
        Self {
            snapshots: Arc::default(),
            synthetic: true,
        }
    }

    pub fn with_snapshot(mut self, symbol: &str, snapshot: SymbolSnapshot) -> Self {
        Arc::make_mut(&mut self.snapshots).insert(base_symbol(symbol), snapshot);
        self
    }

    fn lookup(&self, symbol: &str) -> Result<SymbolSnapshot> {
        if let Some(snapshot) = self.snapshots.get(&base_symbol(symbol)) {
            return Ok(snapshot.clone());
        }
        if self.synthetic {
            return Ok(synthesize(symbol, Utc::now().date_naive()));
        }
        Err(Error::data_unavailable(symbol, "unknown symbol"))
    }
}

/// FNV-1a over the base symbol, so `INFY` and `INFY.NS` share data
fn symbol_seed(symbol: &str) -> u64 {
    base_symbol(symbol)
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325, |hash, b| {
            (hash ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
        })
}

/// A plausible year of data for `symbol`, ending at `end`
pub fn synthesize(symbol: &str, end: NaiveDate) -> SymbolSnapshot {
    let mut rng = SampleRng::new(symbol_seed(symbol));
    let between = |rng: &mut SampleRng, lo: f64, hi: f64| lo + rng.next_f64() * (hi - lo);

    let mut close = between(&mut rng, 5.0, 95.0);
    let drift = between(&mut rng, -0.001, 0.0015);
    let base_volume = between(&mut rng, 2_000.0, 200_000.0);

    let days = 365;
    let mut history = Vec::with_capacity(days);
    for i in 0..days {
        let shock = between(&mut rng, -0.025, 0.025);
        close = (close * (1.0 + drift + shock)).max(0.5);
        let volume = base_volume * between(&mut rng, 0.5, 1.5);
        let date = end - Duration::days((days - 1 - i) as i64);
        history.push(PriceBar {
            date,
            open: Some(close * (1.0 - shock / 2.0)),
            high: Some(close * 1.01),
            low: Some(close * 0.99),
            close,
            volume: Some(volume.round()),
        });
    }

    let shares = between(&mut rng, 1.0e7, 5.0e8).round();
    let company = CompanyInfo {
        symbol: symbol.to_string(),
        name: Some(format!("{} Industries", base_symbol(symbol))),
        sector: Some("Technology".to_string()),
        industry: Some("Software".to_string()),
        market_cap: Some(close * shares),
        current_price: Some(close),
        business_summary: Some(format!(
            "{} Industries builds and operates software platforms for enterprise \
             customers across banking, retail and manufacturing.",
            base_symbol(symbol)
        )),
        promoter_holding: Some(between(&mut rng, 10.0, 80.0)),
        institutional_holding: Some(between(&mut rng, 5.0, 40.0)),
        shares_outstanding: Some(shares),
        float_shares: Some((shares * between(&mut rng, 0.05, 0.7)).round()),
        governance_risk: Some(between(&mut rng, 1.0, 10.0).round()),
        ..Default::default()
    };

    let fundamentals = Fundamentals {
        symbol: symbol.to_string(),
        trailing_pe: Some(between(&mut rng, 3.0, 40.0)),
        price_to_book: Some(between(&mut rng, 0.5, 5.0)),
        return_on_equity: Some(between(&mut rng, -5.0, 25.0)),
        profit_margin: Some(between(&mut rng, -5.0, 20.0)),
        current_ratio: Some(between(&mut rng, 0.6, 3.0)),
        debt_to_equity: Some(between(&mut rng, 0.1, 2.5)),
        revenue_growth: Some(between(&mut rng, -15.0, 30.0)),
        earnings_growth: Some(between(&mut rng, -20.0, 30.0)),
        total_revenue: Some(between(&mut rng, 1.0e8, 5.0e9).round()),
        operating_cash_flow: Some(between(&mut rng, -1.0e7, 5.0e8).round()),
        free_cash_flow: Some(between(&mut rng, -5.0e7, 3.0e8).round()),
        ..Default::default()
    };

    SymbolSnapshot {
        company,
        fundamentals: Some(fundamentals),
        history,
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketData {
    async fn company_info(&self, symbol: &str) -> Result<CompanyInfo> {
        Ok(self.lookup(symbol)?.company)
    }

    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals> {
        self.lookup(symbol)?
            .fundamentals
            .ok_or_else(|| Error::data_unavailable(symbol, "no fundamentals registered"))
    }

    async fn price_history(&self, symbol: &str, days: u32) -> Result<Vec<PriceBar>> {
        let history = self.lookup(symbol)?.history;
        let keep = (days as usize).min(history.len());
        Ok(history[history.len() - keep..].to_vec())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
