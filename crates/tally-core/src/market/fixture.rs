//! Offline provider reading `<dir>/<SYMBOL>.json` snapshots

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::symbols::base_symbol;
use super::{CompanyInfo, Fundamentals, MarketDataProvider, PriceBar};

/// Everything the analyzer needs for one symbol, as stored on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolSnapshot {
    pub company: CompanyInfo,
    pub fundamentals: Option<Fundamentals>,
    pub history: Vec<PriceBar>,
}

#[derive(Clone)]
pub struct FixtureMarketData {
    dir: PathBuf,
}

impl FixtureMarketData {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot file for a symbol; `INFY.NS` is looked up as `INFY.NS.json`
    /// first, then `INFY.json`
    fn load(&self, symbol: &str) -> Result<SymbolSnapshot> {
        let candidates = [
            self.dir.join(format!("{}.json", symbol)),
            self.dir.join(format!("{}.json", base_symbol(symbol))),
        ];
        let path = candidates
            .iter()
            .find(|p| p.exists())
            .ok_or_else(|| Error::data_unavailable(symbol, "no fixture file"))?;

        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl MarketDataProvider for FixtureMarketData {
    async fn company_info(&self, symbol: &str) -> Result<CompanyInfo> {
        Ok(self.load(symbol)?.company)
    }

    async fn fundamentals(&self, symbol: &str) -> Result<Fundamentals> {
        self.load(symbol)?
            .fundamentals
            .ok_or_else(|| Error::data_unavailable(symbol, "fixture has no fundamentals"))
    }

    async fn price_history(&self, symbol: &str, days: u32) -> Result<Vec<PriceBar>> {
        let history = self.load(symbol)?.history;
        let Some(last) = history.iter().map(|b| b.date).max() else {
            return Ok(history);
        };
        let cutoff: NaiveDate = last - Duration::days(i64::from(days));
        Ok(history.into_iter().filter(|b| b.date > cutoff).collect())
    }

    fn name(&self) -> &str {
        "fixture"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_snapshot(dir: &Path, name: &str) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let snapshot = SymbolSnapshot {
            company: CompanyInfo {
                symbol: "INFY.NS".into(),
                name: Some("Infosys".into()),
                current_price: Some(42.0),
                ..Default::default()
            },
            fundamentals: None,
            history: (0..10)
                .map(|i| PriceBar::new(start + Duration::days(i), 40.0 + i as f64, 5000.0))
                .collect(),
        };
        fs::write(
            dir.join(name),
            serde_json::to_string(&snapshot).unwrap(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_reads_snapshot_by_base_symbol() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(dir.path(), "INFY.json");
        let provider = FixtureMarketData::new(dir.path());

        let info = provider.company_info("INFY.NS").await.unwrap();
        assert_eq!(info.name.as_deref(), Some("Infosys"));
        assert_eq!(provider.price_history("INFY.NS", 365).await.unwrap().len(), 10);
        assert_eq!(provider.price_history("INFY.NS", 3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_file_and_fundamentals_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        write_snapshot(dir.path(), "INFY.NS.json");
        let provider = FixtureMarketData::new(dir.path());

        assert!(matches!(
            provider.fundamentals("INFY.NS").await,
            Err(Error::DataUnavailable { .. })
        ));
        assert!(matches!(
            provider.company_info("TCS.NS").await,
            Err(Error::DataUnavailable { .. })
        ));
    }
}
