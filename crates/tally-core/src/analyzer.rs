//! Batch analyzer
//!
//! Runs the profile, fundamental and technical analyzers for each symbol and
//! turns the results into a [`ScoreCard`]. Batches run concurrently, bounded
//! by `analysis.concurrency`; one failing symbol never aborts the rest.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::analysis::{
    analyze_fundamentals, analyze_profile, analyze_technical, FundamentalAnalysis,
    ProfileAnalysis, TechnicalAnalysis,
};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::market::{normalize_all, normalize_symbol, MarketDataClient, MarketDataProvider};
use crate::scoring::{score_card, InvestmentCategory, ScoreCard};

/// Everything computed for one symbol
#[derive(Debug, Clone, Serialize)]
pub struct SymbolAnalysis {
    pub profile: ProfileAnalysis,
    pub fundamental: FundamentalAnalysis,
    pub technical: TechnicalAnalysis,
    pub score_card: ScoreCard,
}

/// Result of one unit in a batch
#[derive(Debug, Clone)]
pub enum SymbolOutcome {
    Scored(Box<SymbolAnalysis>),
    Failed { symbol: String, error: String },
}

impl SymbolOutcome {
    pub fn symbol(&self) -> &str {
        match self {
            SymbolOutcome::Scored(a) => &a.score_card.symbol,
            SymbolOutcome::Failed { symbol, .. } => symbol,
        }
    }

    pub fn card(&self) -> Option<&ScoreCard> {
        match self {
            SymbolOutcome::Scored(a) => Some(&a.score_card),
            SymbolOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Clone)]
pub struct Analyzer {
    client: MarketDataClient,
    config: Arc<AppConfig>,
}

impl Analyzer {
    pub fn new(client: MarketDataClient, config: Arc<AppConfig>) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Fetch and analyze one symbol
    ///
    /// A missing company profile is fatal for the symbol. Missing fundamentals
    /// or history degrade to a zero-score analysis carrying the error.
    pub async fn analyze_symbol(&self, raw: &str) -> Result<SymbolAnalysis> {
        let symbol = normalize_symbol(raw, self.config.market.exchange)?;
        debug!(symbol = %symbol, provider = self.client.name(), "Analyzing symbol");

        let info = self
            .client
            .company_info(&symbol)
            .await
            .map_err(|e| match e {
                Error::DataUnavailable { .. } => e,
                other => Error::data_unavailable(&symbol, other.to_string()),
            })?;
        let profile = analyze_profile(&info, &self.config);

        let fundamental = match self.client.fundamentals(&symbol).await {
            Ok(data) => analyze_fundamentals(&data),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Fundamental data unavailable");
                FundamentalAnalysis::failed(&symbol, e.to_string())
            }
        };

        let days = self.config.analysis.history_days;
        let technical = match self.client.price_history(&symbol, days).await {
            Ok(bars) => analyze_technical(
                &symbol,
                &bars,
                &self.config.technical_indicators,
                &self.config.risk_flags,
            ),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Price history unavailable");
                TechnicalAnalysis::failed(&symbol, e.to_string())
            }
        };

        let card = score_card(&profile, &fundamental, &technical, &self.config);
        info!(
            symbol = %symbol,
            score = card.overall_score,
            recommendation = %card.recommendation,
            "Scored symbol"
        );

        Ok(SymbolAnalysis {
            profile,
            fundamental,
            technical,
            score_card: card,
        })
    }

    /// Analyze many symbols concurrently
    ///
    /// Invalid symbols are logged and skipped. Scored outcomes come first,
    /// highest overall score first; failures follow in symbol order.
    pub async fn analyze_batch<S: AsRef<str>>(&self, raw: &[S]) -> Vec<SymbolOutcome> {
        let (symbols, rejected) = normalize_all(raw, self.config.market.exchange);
        for bad in &rejected {
            warn!(symbol = %bad, "Skipping invalid symbol");
        }
        info!(
            count = symbols.len(),
            concurrency = self.config.analysis.concurrency,
            "Starting batch analysis"
        );

        let permits = Arc::new(Semaphore::new(self.config.analysis.concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for symbol in symbols {
            let analyzer = self.clone();
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let outcome = match permits.acquire_owned().await {
                    Ok(_permit) => analyzer.analyze_symbol(&symbol).await,
                    Err(e) => Err(Error::InvalidData(format!("batch closed: {}", e))),
                };
                match outcome {
                    Ok(analysis) => SymbolOutcome::Scored(Box::new(analysis)),
                    Err(e) => {
                        warn!(symbol = %symbol, error = %e, "Symbol analysis failed");
                        SymbolOutcome::Failed {
                            symbol,
                            error: e.to_string(),
                        }
                    }
                }
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!(error = %e, "Analysis task panicked"),
            }
        }

        sort_outcomes(&mut outcomes);
        outcomes
    }
}

fn sort_outcomes(outcomes: &mut [SymbolOutcome]) {
    outcomes.sort_by(|a, b| match (a.card(), b.card()) {
        (Some(x), Some(y)) => y
            .overall_score
            .total_cmp(&x.overall_score)
            .then_with(|| x.symbol.cmp(&y.symbol)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.symbol().cmp(b.symbol()),
    });
}

/// Score cards of the scored outcomes, in batch order
pub fn score_cards(outcomes: &[SymbolOutcome]) -> Vec<&ScoreCard> {
    outcomes.iter().filter_map(SymbolOutcome::card).collect()
}

// ============================================================================
// Summary and filters
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TopScore {
    pub symbol: String,
    pub score: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub scored: usize,
    pub failed: usize,
    pub average_score: Option<f64>,
    pub median_score: Option<f64>,
    pub max_score: Option<f64>,
    pub min_score: Option<f64>,
    pub category_distribution: BTreeMap<String, usize>,
    pub top_5: Vec<TopScore>,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[SymbolOutcome]) -> Self {
        let cards = score_cards(outcomes);
        let mut scores: Vec<f64> = cards.iter().map(|c| c.overall_score).collect();
        scores.sort_by(f64::total_cmp);

        let mut category_distribution = BTreeMap::new();
        for card in &cards {
            *category_distribution
                .entry(card.category.to_string())
                .or_insert(0) += 1;
        }

        let mut ranked = cards.clone();
        ranked.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));
        let top_5 = ranked
            .iter()
            .take(5)
            .map(|c| TopScore {
                symbol: c.symbol.clone(),
                score: c.overall_score,
                recommendation: c.recommendation.to_string(),
            })
            .collect();

        Self {
            total: outcomes.len(),
            scored: cards.len(),
            failed: outcomes.len() - cards.len(),
            average_score: (!scores.is_empty())
                .then(|| crate::analysis::round2(scores.iter().sum::<f64>() / scores.len() as f64)),
            median_score: median(&scores),
            max_score: scores.last().copied(),
            min_score: scores.first().copied(),
            category_distribution,
            top_5,
        }
    }
}

fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some(crate::analysis::round2((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)),
    }
}

/// Buy-side cards (Strong Buy, Buy, Moderate Buy), best first
pub fn top_picks<'a>(cards: &[&'a ScoreCard], n: usize) -> Vec<&'a ScoreCard> {
    let mut picks: Vec<&ScoreCard> = cards
        .iter()
        .copied()
        .filter(|c| c.recommendation.is_buy())
        .collect();
    picks.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));
    picks.truncate(n);
    picks
}

/// Criteria for [`filter_by`]; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct CardFilter {
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub liquid_only: bool,
    pub categories: Vec<InvestmentCategory>,
}

pub fn filter_by<'a>(cards: &[&'a ScoreCard], filter: &CardFilter) -> Vec<&'a ScoreCard> {
    cards
        .iter()
        .copied()
        .filter(|c| filter.min_score.map_or(true, |min| c.overall_score >= min))
        .filter(|c| filter.max_score.map_or(true, |max| c.overall_score <= max))
        .filter(|c| !filter.liquid_only || c.is_liquid)
        .filter(|c| filter.categories.is_empty() || filter.categories.contains(&c.category))
        .collect()
}
