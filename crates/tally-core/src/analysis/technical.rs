//! Technical analysis: indicators, trends, volume, volatility and signals
//! over a daily price history, folded into a 0-10 technical score.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{RiskFlagConfig, TechnicalConfig};
use crate::market::PriceBar;

use super::indicators::{self, Bollinger, Macd};
use super::{clamp_score, round2};

const SHORT_TERM_DAYS: usize = 30;
const MEDIUM_TERM_DAYS: usize = 90;
const LONG_TERM_DAYS: usize = 365;
const SUPPORT_LOOKBACK: usize = 180;
const SUPPORT_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendDirection {
    Uptrend,
    Downtrend,
    Sideways,
}

impl TrendDirection {
    /// Direction of a percentage move given the band that counts as flat
    pub fn classify(change: f64, band: f64) -> Self {
        if change > band {
            Self::Uptrend
        } else if change < -band {
            Self::Downtrend
        } else {
            Self::Sideways
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uptrend => "Uptrend",
            Self::Downtrend => "Downtrend",
            Self::Sideways => "Sideways",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overall trading signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Bullish,
    Bearish,
}

/// One observation feeding the overall signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalNote {
    pub description: String,
    pub bias: Bias,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    pub sma: BTreeMap<usize, f64>,
    pub ema: BTreeMap<usize, f64>,
    pub rsi: Option<f64>,
    pub macd: Option<Macd>,
    pub bollinger: Option<Bollinger>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trends {
    /// 30-day change, percent
    pub short_term: Option<f64>,
    /// 90-day change, percent
    pub medium_term: Option<f64>,
    /// Change over a full year of bars, percent
    pub long_term: Option<f64>,
    pub high_52w: f64,
    pub low_52w: f64,
    /// Percent below the 52-week high (negative or zero)
    pub distance_from_high: Option<f64>,
    /// Percent above the 52-week low
    pub distance_from_low: Option<f64>,
}

impl Trends {
    pub fn short_term_direction(&self) -> Option<TrendDirection> {
        self.short_term.map(|c| TrendDirection::classify(c, 5.0))
    }

    pub fn medium_term_direction(&self) -> Option<TrendDirection> {
        self.medium_term.map(|c| TrendDirection::classify(c, 10.0))
    }

    pub fn long_term_direction(&self) -> Option<TrendDirection> {
        self.long_term.map(|c| TrendDirection::classify(c, 15.0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    /// Up to three highest distinct support levels
    pub support_levels: Vec<f64>,
    pub resistance_levels: Vec<f64>,
    pub nearest_support: Option<f64>,
    pub nearest_resistance: Option<f64>,
    /// Percent of the current price down to the nearest support
    pub distance_to_support: Option<f64>,
    pub distance_to_resistance: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeAnalysis {
    pub avg_volume_30d: f64,
    pub avg_volume_90d: f64,
    pub current_volume: f64,
    /// Current volume over the 30-day average
    pub volume_ratio: Option<f64>,
    pub is_liquid: bool,
}

impl VolumeAnalysis {
    pub fn signal(&self) -> Option<&'static str> {
        self.volume_ratio.map(|r| {
            if r > 1.5 {
                "High Volume"
            } else if r < 0.5 {
                "Low Volume"
            } else {
                "Normal Volume"
            }
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volatility {
    /// Daily return standard deviation, percent
    pub daily: Option<f64>,
    pub annualized: Option<f64>,
    /// Daily figure over the last 30 returns
    pub recent: Option<f64>,
}

impl Volatility {
    /// "Increasing", "Decreasing" or "Stable", comparing recent to overall
    pub fn trend(&self) -> Option<&'static str> {
        let (daily, recent) = (self.daily?, self.recent?);
        if daily <= 0.0 {
            return None;
        }
        let ratio = recent / daily;
        Some(if ratio > 1.2 {
            "Increasing"
        } else if ratio < 0.8 {
            "Decreasing"
        } else {
            "Stable"
        })
    }
}

/// Result of analyzing one symbol's price history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAnalysis {
    pub symbol: String,
    pub data_points: usize,
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    /// Last day's change, percent
    pub price_change: Option<f64>,
    pub indicators: Indicators,
    pub trends: Trends,
    pub support_resistance: SupportResistance,
    pub volume: VolumeAnalysis,
    pub volatility: Volatility,
    pub signals: Vec<SignalNote>,
    pub overall_signal: Signal,
    pub technical_score: f64,
    pub insights: Vec<String>,
    pub error: Option<String>,
}

impl TechnicalAnalysis {
    /// Placeholder for a symbol whose history could not be analyzed
    pub fn failed(symbol: &str, error: impl Into<String>) -> Self {
        Self {
            symbol: symbol.to_string(),
            technical_score: 0.0,
            insights: vec!["Data unavailable - technical analysis failed".to_string()],
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_liquid(&self) -> bool {
        self.error.is_none() && self.volume.is_liquid
    }
}

/// Analyze a validated, date-sorted price history
pub fn analyze_technical(
    symbol: &str,
    bars: &[PriceBar],
    config: &TechnicalConfig,
    risk: &RiskFlagConfig,
) -> TechnicalAnalysis {
    if bars.is_empty() {
        return TechnicalAnalysis::failed(symbol, "No historical data available");
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let current = *closes.last().unwrap_or(&0.0);
    let previous = if closes.len() > 1 {
        closes[closes.len() - 2]
    } else {
        current
    };

    let indicators = compute_indicators(&closes, config);
    let trends = compute_trends(&closes);
    let support_resistance = find_support_resistance(bars);
    let volume = analyze_volume(bars, risk.min_trading_volume);
    let volatility = analyze_volatility(&closes);
    let signals = collect_signals(current, &indicators);
    let overall_signal = overall_signal(&signals);

    let mut analysis = TechnicalAnalysis {
        symbol: symbol.to_string(),
        data_points: bars.len(),
        current_price: Some(current),
        previous_close: Some(previous),
        price_change: indicators::pct_change(previous, current),
        indicators,
        trends,
        support_resistance,
        volume,
        volatility,
        signals,
        overall_signal,
        technical_score: 0.0,
        insights: Vec::new(),
        error: None,
    };
    analysis.technical_score = technical_score(&analysis);
    analysis.insights = technical_insights(&analysis);

    tracing::debug!(
        symbol,
        score = analysis.technical_score,
        signal = %analysis.overall_signal,
        "Technical analysis complete"
    );
    analysis
}

fn compute_indicators(closes: &[f64], config: &TechnicalConfig) -> Indicators {
    let mut out = Indicators::default();
    for &period in &config.moving_averages {
        if let Some(v) = indicators::sma(closes, period) {
            out.sma.insert(period, v);
        }
        if let Some(v) = indicators::ema(closes, period) {
            out.ema.insert(period, v);
        }
    }
    out.rsi = indicators::rsi(closes, config.rsi_period);
    out.macd = indicators::macd(closes, config.macd_fast, config.macd_slow, config.macd_signal);
    out.bollinger = indicators::bollinger(closes, config.bollinger_period, config.bollinger_std);
    out
}

fn trailing_change(closes: &[f64], days: usize) -> Option<f64> {
    if closes.len() < days {
        return None;
    }
    indicators::pct_change(closes[closes.len() - days], closes[closes.len() - 1])
}

fn compute_trends(closes: &[f64]) -> Trends {
    let current = closes.last().copied().unwrap_or(0.0);
    let high = closes.iter().copied().fold(f64::MIN, f64::max);
    let low = closes.iter().copied().fold(f64::MAX, f64::min);

    Trends {
        short_term: trailing_change(closes, SHORT_TERM_DAYS),
        medium_term: trailing_change(closes, MEDIUM_TERM_DAYS),
        long_term: if closes.len() >= LONG_TERM_DAYS {
            indicators::pct_change(closes[0], current)
        } else {
            None
        },
        high_52w: high,
        low_52w: low,
        distance_from_high: indicators::pct_change(high, current),
        distance_from_low: indicators::pct_change(low, current),
    }
}

/// Local lows/highs over the last six months, each the extreme of the
/// surrounding `SUPPORT_WINDOW` bars on both sides
pub fn find_support_resistance(bars: &[PriceBar]) -> SupportResistance {
    let recent = &bars[bars.len().saturating_sub(SUPPORT_LOOKBACK)..];
    let lows: Vec<f64> = recent.iter().map(|b| b.low.unwrap_or(b.close)).collect();
    let highs: Vec<f64> = recent.iter().map(|b| b.high.unwrap_or(b.close)).collect();
    let current = match bars.last() {
        Some(bar) => bar.close,
        None => return SupportResistance::default(),
    };

    let mut supports = Vec::new();
    let mut resistances = Vec::new();
    if recent.len() > 2 * SUPPORT_WINDOW {
        for i in SUPPORT_WINDOW..recent.len() - SUPPORT_WINDOW {
            let span = i - SUPPORT_WINDOW..i + SUPPORT_WINDOW;
            if lows[i] <= lows[span.clone()].iter().copied().fold(f64::MAX, f64::min) {
                supports.push(lows[i]);
            }
            if highs[i] >= highs[span].iter().copied().fold(f64::MIN, f64::max) {
                resistances.push(highs[i]);
            }
        }
    }

    let top_levels = |levels: &[f64]| {
        let mut rounded: Vec<f64> = levels.iter().map(|v| round2(*v)).collect();
        rounded.sort_by(f64::total_cmp);
        rounded.dedup();
        rounded[rounded.len().saturating_sub(3)..].to_vec()
    };

    let nearest_support = supports
        .iter()
        .copied()
        .filter(|s| *s < current)
        .reduce(f64::max);
    let nearest_resistance = resistances
        .iter()
        .copied()
        .filter(|r| *r > current)
        .reduce(f64::min);
    let distance = |level: f64| (current > 0.0).then(|| round2((level - current).abs() / current * 100.0));

    SupportResistance {
        support_levels: top_levels(&supports),
        resistance_levels: top_levels(&resistances),
        nearest_support,
        nearest_resistance,
        distance_to_support: nearest_support.and_then(distance),
        distance_to_resistance: nearest_resistance.and_then(distance),
    }
}

fn analyze_volume(bars: &[PriceBar], min_trading_volume: f64) -> VolumeAnalysis {
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume.unwrap_or(0.0)).collect();
    let tail = |n: usize| &volumes[volumes.len().saturating_sub(n)..];

    let avg_30 = indicators::mean(tail(SHORT_TERM_DAYS)).unwrap_or(0.0);
    let avg_90 = indicators::mean(tail(MEDIUM_TERM_DAYS)).unwrap_or(0.0);
    let current = volumes.last().copied().unwrap_or(0.0);

    VolumeAnalysis {
        avg_volume_30d: avg_30,
        avg_volume_90d: avg_90,
        current_volume: current,
        volume_ratio: (avg_30 > 0.0).then(|| current / avg_30),
        is_liquid: avg_30 >= min_trading_volume,
    }
}

fn analyze_volatility(closes: &[f64]) -> Volatility {
    let returns = indicators::returns(closes);
    let daily = indicators::std_dev(&returns).map(|sd| sd * 100.0);
    let recent = if returns.len() >= SHORT_TERM_DAYS {
        indicators::std_dev(&returns[returns.len() - SHORT_TERM_DAYS..]).map(|sd| sd * 100.0)
    } else {
        daily
    };

    Volatility {
        daily,
        annualized: indicators::annualized_volatility(closes),
        recent,
    }
}

fn note(description: &str, bias: Bias) -> SignalNote {
    SignalNote {
        description: description.to_string(),
        bias,
    }
}

fn collect_signals(current: f64, ind: &Indicators) -> Vec<SignalNote> {
    let mut notes = Vec::new();

    if let Some(rsi) = ind.rsi {
        if rsi < 30.0 {
            notes.push(note("RSI: Oversold - Potential Buy", Bias::Bullish));
        } else if rsi > 70.0 {
            notes.push(note("RSI: Overbought - Potential Sell", Bias::Bearish));
        }
    }

    if let Some(macd) = ind.macd {
        if macd.histogram > 0.0 {
            notes.push(note("MACD: Bullish", Bias::Bullish));
        } else {
            notes.push(note("MACD: Bearish", Bias::Bearish));
        }
    }

    let sma_50 = ind.sma.get(&50).copied();
    let sma_200 = ind.sma.get(&200).copied();
    if let Some(sma_50) = sma_50 {
        if current > sma_50 {
            notes.push(note("Price above SMA50", Bias::Bullish));
        } else {
            notes.push(note("Price below SMA50", Bias::Bearish));
        }
    }
    if let (Some(sma_50), Some(sma_200)) = (sma_50, sma_200) {
        if sma_50 > sma_200 {
            notes.push(note("Golden Cross", Bias::Bullish));
        } else if sma_50 < sma_200 {
            notes.push(note("Death Cross", Bias::Bearish));
        }
    }

    notes
}

/// BUY or SELL needs a margin of at least two notes; anything closer is HOLD
pub fn overall_signal(notes: &[SignalNote]) -> Signal {
    let bullish = notes.iter().filter(|n| n.bias == Bias::Bullish).count();
    let bearish = notes.len() - bullish;
    if bullish > bearish + 1 {
        Signal::Buy
    } else if bearish > bullish + 1 {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

/// Start at 5 and adjust per factor. A missing measurement adjusts nothing.
pub fn technical_score(a: &TechnicalAnalysis) -> f64 {
    let mut score = 5.0;

    if let Some(short) = a.trends.short_term {
        score += match short {
            s if s > 10.0 => 1.5,
            s if s > 5.0 => 1.0,
            s if s < -10.0 => -1.5,
            s if s < -5.0 => -1.0,
            _ => 0.0,
        };
    }
    if let Some(medium) = a.trends.medium_term {
        score += match medium {
            m if m > 15.0 => 1.5,
            m if m > 10.0 => 0.5,
            m if m < -15.0 => -1.5,
            m if m < -10.0 => -0.5,
            _ => 0.0,
        };
    }

    if let Some(rsi) = a.indicators.rsi {
        if (40.0..=60.0).contains(&rsi) {
            score += 1.0;
        } else if rsi < 30.0 {
            score += 0.5;
        } else if rsi > 70.0 {
            score -= 1.0;
        }
    }
    if let Some(macd) = a.indicators.macd {
        score += if macd.histogram > 0.0 { 1.0 } else { -0.5 };
    }

    score += if a.volume.is_liquid { 1.0 } else { -2.0 };
    if let Some(ratio) = a.volume.volume_ratio {
        if (0.8..=1.5).contains(&ratio) {
            score += 0.5;
        } else if ratio < 0.3 {
            score -= 1.0;
        }
    }

    if let Some(vol) = a.volatility.annualized {
        if (20.0..=50.0).contains(&vol) {
            score += 1.0;
        } else if vol < 15.0 {
            score += 0.5;
        } else if vol > 80.0 {
            score -= 1.5;
        }
    }

    if let Some(from_low) = a.trends.distance_from_low {
        if from_low > 20.0 {
            score += 0.5;
        }
        if (30.0..=70.0).contains(&from_low) || from_low < 10.0 {
            score += 0.5;
        }
    }

    score += match a.overall_signal {
        Signal::Buy => 1.0,
        Signal::Sell => -1.0,
        Signal::Hold => 0.0,
    };

    round2(clamp_score(score))
}

fn technical_insights(a: &TechnicalAnalysis) -> Vec<String> {
    let mut insights = Vec::new();

    if let Some(direction) = a.trends.short_term_direction() {
        insights.push(format!("Short-term: {}", direction));
    }
    if let Some(rsi) = a.indicators.rsi {
        if rsi < 30.0 {
            insights.push(format!("RSI at {:.1} - Oversold territory", rsi));
        } else if rsi > 70.0 {
            insights.push(format!("RSI at {:.1} - Overbought territory", rsi));
        }
    }
    if !a.volume.is_liquid {
        insights.push("Low liquidity - Higher risk".to_string());
    }
    if a.volume.signal() == Some("High Volume") {
        insights.push("High trading volume".to_string());
    }
    if a.volatility.trend() == Some("Increasing") {
        insights.push("Increasing volatility - Higher risk".to_string());
    }
    insights.push(format!("Technical Signal: {}", a.overall_signal));

    if let Some(dist) = a.support_resistance.distance_to_support {
        if dist < 3.0 {
            insights.push(format!("Near support level ({:.1}% away)", dist));
        }
    }
    if let Some(dist) = a.support_resistance.distance_to_resistance {
        if dist < 5.0 {
            insights.push(format!("Approaching resistance ({:.1}% away)", dist));
        }
    }

    insights
}
