//! Scoring aggregator
//!
//! Combines the four 0-10 sub-scores (profile, fundamental, technical, risk)
//! into one weighted overall score and maps it onto fixed recommendation
//! bands:
//!
//! | Overall score | Recommendation   |
//! |---------------|------------------|
//! | [8.0, 10.0]   | Strong Buy       |
//! | [7.0, 8.0)    | Buy              |
//! | [6.0, 7.0)    | Moderate Buy     |
//! | [5.0, 6.0)    | Hold             |
//! | [4.0, 5.0)    | Monitor          |
//! | [3.0, 4.0)    | Consider Selling |
//! | [0.0, 3.0)    | Avoid            |
//!
//! The overall score is clamped and rounded to two decimals, both of which
//! are non-decreasing, so raising any sub-score never lowers the overall
//! score or the band. Eligibility (price range, liquidity, data gaps) is
//! reported next to the band and never changes it.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{
    clamp_score, round2, FundamentalAnalysis, MarketCapCategory, ProfileAnalysis, Signal,
    TechnicalAnalysis,
};
use crate::config::{AppConfig, PriceRange};
use crate::error::ConfigError;

const WEIGHT_TOLERANCE: f64 = 1e-6;
const MAX_REASONS: usize = 5;

// ============================================================================
// Weights and components
// ============================================================================

/// Component weights in percent, summing to 100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    #[serde(rename = "company_profile")]
    pub profile: f64,
    #[serde(rename = "fundamental_analysis")]
    pub fundamental: f64,
    #[serde(rename = "technical_analysis")]
    pub technical: f64,
    #[serde(rename = "risk_factors")]
    pub risk: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            profile: 15.0,
            fundamental: 40.0,
            technical: 30.0,
            risk: 15.0,
        }
    }
}

impl ScoringWeights {
    pub fn new(
        profile: f64,
        fundamental: f64,
        technical: f64,
        risk: f64,
    ) -> Result<Self, ConfigError> {
        let weights = Self {
            profile,
            fundamental,
            technical,
            risk,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn sum(&self) -> f64 {
        self.profile + self.fundamental + self.technical + self.risk
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("company_profile", self.profile),
            ("fundamental_analysis", self.fundamental),
            ("technical_analysis", self.technical),
            ("risk_factors", self.risk),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }

        let sum = self.sum();
        if (sum - 100.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightsNotNormalized { sum });
        }
        Ok(())
    }
}

/// The four sub-scores, each in [0, 10]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub profile: f64,
    pub fundamental: f64,
    pub technical: f64,
    pub risk: f64,
}

impl ScoreComponents {
    pub fn new(profile: f64, fundamental: f64, technical: f64, risk: f64) -> Self {
        Self {
            profile,
            fundamental,
            technical,
            risk,
        }
        .clamped()
    }

    /// Each component forced into [0, 10]; NaN counts as 0
    pub fn clamped(self) -> Self {
        let fix = |v: f64| if v.is_nan() { 0.0 } else { clamp_score(v) };
        Self {
            profile: fix(self.profile),
            fundamental: fix(self.fundamental),
            technical: fix(self.technical),
            risk: fix(self.risk),
        }
    }
}

/// Weighted overall score in [0, 10], rounded to 2 decimals
pub fn overall_score(components: &ScoreComponents, weights: &ScoringWeights) -> f64 {
    let c = components.clamped();
    let weighted = c.profile * weights.profile
        + c.fundamental * weights.fundamental
        + c.technical * weights.technical
        + c.risk * weights.risk;
    round2(clamp_score(weighted / 100.0))
}

// ============================================================================
// Buckets
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    #[serde(rename = "Buy")]
    Buy,
    #[serde(rename = "Moderate Buy")]
    ModerateBuy,
    #[serde(rename = "Hold")]
    Hold,
    #[serde(rename = "Monitor")]
    Monitor,
    #[serde(rename = "Consider Selling")]
    ConsiderSelling,
    #[serde(rename = "Avoid")]
    Avoid,
}

impl Recommendation {
    pub const ALL: [Recommendation; 7] = [
        Self::StrongBuy,
        Self::Buy,
        Self::ModerateBuy,
        Self::Hold,
        Self::Monitor,
        Self::ConsiderSelling,
        Self::Avoid,
    ];

    /// Band for an overall score (lower edges inclusive)
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 8.0 => Self::StrongBuy,
            s if s >= 7.0 => Self::Buy,
            s if s >= 6.0 => Self::ModerateBuy,
            s if s >= 5.0 => Self::Hold,
            s if s >= 4.0 => Self::Monitor,
            s if s >= 3.0 => Self::ConsiderSelling,
            _ => Self::Avoid,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrongBuy => "Strong Buy",
            Self::Buy => "Buy",
            Self::ModerateBuy => "Moderate Buy",
            Self::Hold => "Hold",
            Self::Monitor => "Monitor",
            Self::ConsiderSelling => "Consider Selling",
            Self::Avoid => "Avoid",
        }
    }

    /// Higher is better; Avoid is 0
    pub fn rank(&self) -> u8 {
        match self {
            Self::StrongBuy => 6,
            Self::Buy => 5,
            Self::ModerateBuy => 4,
            Self::Hold => 3,
            Self::Monitor => 2,
            Self::ConsiderSelling => 1,
            Self::Avoid => 0,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Self::StrongBuy | Self::Buy | Self::ModerateBuy)
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Recommendation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['_', '-'], " ");
        Self::ALL
            .into_iter()
            .find(|r| r.as_str().to_lowercase() == wanted)
            .ok_or_else(|| format!("Unknown recommendation: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InvestmentCategory {
    Excellent,
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    Fair,
    #[serde(rename = "Below Average")]
    BelowAverage,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
}

impl InvestmentCategory {
    pub const ALL: [InvestmentCategory; 7] = [
        Self::Excellent,
        Self::VeryGood,
        Self::Good,
        Self::Fair,
        Self::BelowAverage,
        Self::Poor,
        Self::VeryPoor,
    ];

    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 8.0 => Self::Excellent,
            s if s >= 7.0 => Self::VeryGood,
            s if s >= 6.0 => Self::Good,
            s if s >= 5.0 => Self::Fair,
            s if s >= 4.0 => Self::BelowAverage,
            s if s >= 3.0 => Self::Poor,
            _ => Self::VeryPoor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::VeryGood => "Very Good",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::BelowAverage => "Below Average",
            Self::Poor => "Poor",
            Self::VeryPoor => "Very Poor",
        }
    }
}

impl fmt::Display for InvestmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InvestmentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['_', '-'], " ");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().to_lowercase() == wanted)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Advisory gate reported next to the recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    Eligible,
    OutOfPriceRange,
    LowLiquidity,
    InsufficientData,
}

impl Eligibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eligible => "Eligible",
            Self::OutOfPriceRange => "Out of Price Range",
            Self::LowLiquidity => "Low Liquidity",
            Self::InsufficientData => "Insufficient Data",
        }
    }

    pub fn is_eligible(&self) -> bool {
        *self == Self::Eligible
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Derived judgements
// ============================================================================

/// Start at 10 (lowest risk) and subtract per risk factor
pub fn risk_score(
    profile: &ProfileAnalysis,
    fundamental: &FundamentalAnalysis,
    technical: &TechnicalAnalysis,
) -> f64 {
    let m = &fundamental.metrics;
    let mut score = 10.0 - profile.red_flags.len() as f64 * 1.5;

    if !technical.is_liquid() {
        score -= 2.0;
    }
    if let Some(de) = m.debt_to_equity {
        if de > 2.0 {
            score -= 2.0;
        } else if de > 1.5 {
            score -= 1.0;
        }
    }
    if let Some(vol) = technical.volatility.annualized {
        if vol > 80.0 {
            score -= 2.0;
        } else if vol > 60.0 {
            score -= 1.0;
        }
    }
    if m.profit_margin.is_some_and(|p| p < 0.0) {
        score -= 2.0;
    }
    if profile.market_cap_category == MarketCapCategory::Micro {
        score -= 1.0;
    }
    if profile.governance_risk.is_some_and(|r| r > 7.0) {
        score -= 1.5;
    }
    if m.current_ratio.is_some_and(|c| c < 1.0) {
        score -= 1.5;
    }
    if let Some(holding) = profile.promoter_holding {
        if holding < 20.0 {
            score -= 1.5;
        } else if holding > 80.0 {
            score -= 0.5;
        }
    }

    round2(clamp_score(score))
}

pub fn eligibility(
    within_price_range: bool,
    fundamental: &FundamentalAnalysis,
    technical: &TechnicalAnalysis,
) -> Eligibility {
    if !within_price_range {
        Eligibility::OutOfPriceRange
    } else if !technical.is_liquid() {
        Eligibility::LowLiquidity
    } else if fundamental.error.is_some() || technical.error.is_some() {
        Eligibility::InsufficientData
    } else {
        Eligibility::Eligible
    }
}

/// Data gaps and agreement between the sub-scores
pub fn confidence(
    profile: &ProfileAnalysis,
    fundamental: &FundamentalAnalysis,
    technical: &TechnicalAnalysis,
) -> Confidence {
    let mut data_issues = 0;
    if profile.company_name == "N/A" {
        data_issues += 1;
    }
    if fundamental.error.is_some() || fundamental.metrics.total_revenue.is_none() {
        data_issues += 1;
    }
    if technical.error.is_some() || technical.data_points < 30 {
        data_issues += 1;
    }

    let agree = |a: f64, b: f64| (a >= 6.0 && b >= 6.0) || (a <= 4.0 && b <= 4.0);
    let mut consistency = 0;
    if agree(profile.profile_score, fundamental.fundamental_score) {
        consistency += 1;
    }
    if agree(fundamental.fundamental_score, technical.technical_score) {
        consistency += 1;
    }

    if data_issues == 0 && consistency >= 2 {
        Confidence::High
    } else if data_issues <= 1 && consistency >= 1 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// "Low Risk", "High Risk (Illiquid, High Volatility)", ...
pub fn risk_level(risk_score: f64, profile: &ProfileAnalysis, technical: &TechnicalAnalysis) -> String {
    let base = match risk_score {
        r if r >= 7.5 => "Low",
        r if r >= 5.5 => "Medium",
        r if r >= 3.5 => "High",
        _ => "Very High",
    };

    let mut notes = Vec::new();
    if !technical.is_liquid() {
        notes.push("Illiquid");
    }
    if profile.red_flags.len() > 3 {
        notes.push("Multiple Red Flags");
    }
    if technical.volatility.annualized.is_some_and(|v| v > 80.0) {
        notes.push("High Volatility");
    }

    if notes.is_empty() {
        format!("{} Risk", base)
    } else {
        format!("{} Risk ({})", base, notes.join(", "))
    }
}

pub fn return_potential(
    overall: f64,
    fundamental: &FundamentalAnalysis,
    technical: &TechnicalAnalysis,
) -> String {
    let base = match overall {
        s if s >= 8.0 => "High (20%+ potential)",
        s if s >= 6.5 => "Medium-High (15-25% potential)",
        s if s >= 5.0 => "Medium (10-20% potential)",
        s if s >= 4.0 => "Low-Medium (5-15% potential)",
        _ => "Low (0-10% potential, high risk)",
    };

    let revenue_growth = fundamental.metrics.revenue_growth.unwrap_or(0.0);
    let price_trend = technical.trends.short_term.unwrap_or(0.0);
    if revenue_growth > 20.0 && price_trend > 10.0 {
        format!("{} - Strong momentum", base)
    } else if revenue_growth < 0.0 || price_trend < -10.0 {
        format!("{} - Declining momentum", base)
    } else {
        base.to_string()
    }
}

pub fn strengths(
    profile: &ProfileAnalysis,
    fundamental: &FundamentalAnalysis,
    technical: &TechnicalAnalysis,
) -> Vec<String> {
    let m = &fundamental.metrics;
    let mut out = Vec::new();

    if profile.profile_score >= 7.0 {
        out.push("Strong company profile".to_string());
    }
    if let Some(holding) = profile.promoter_holding.filter(|h| (30.0..=75.0).contains(h)) {
        out.push(format!("Healthy promoter holding ({:.1}%)", holding));
    }
    if let Some(roe) = m.return_on_equity.filter(|r| *r >= 15.0) {
        out.push(format!("Excellent ROE ({:.1}%)", roe));
    }
    if let Some(growth) = m.revenue_growth.filter(|g| *g >= 15.0) {
        out.push(format!("Strong revenue growth ({:.1}%)", growth));
    }
    if m.debt_to_equity.is_some_and(|d| d < 0.5) {
        out.push("Low debt levels".to_string());
    }
    if technical.is_liquid() {
        out.push("Good liquidity".to_string());
    }
    if technical.overall_signal == Signal::Buy {
        out.push("Bullish technical signals".to_string());
    }
    if technical.trends.short_term.is_some_and(|t| t > 10.0) {
        out.push("Positive price momentum".to_string());
    }

    out.truncate(MAX_REASONS);
    out
}

pub fn weaknesses(
    profile: &ProfileAnalysis,
    fundamental: &FundamentalAnalysis,
    technical: &TechnicalAnalysis,
) -> Vec<String> {
    let m = &fundamental.metrics;
    let mut out: Vec<String> = profile.red_flags.iter().take(2).map(|f| f.to_string()).collect();

    if let Some(roe) = m.return_on_equity.filter(|r| *r < 5.0) {
        out.push(format!("Low ROE ({:.1}%)", roe));
    }
    if let Some(de) = m.debt_to_equity.filter(|d| *d > 2.0) {
        out.push(format!("High debt-to-equity ({:.2})", de));
    }
    if let Some(cr) = m.current_ratio.filter(|c| *c < 1.0) {
        out.push(format!("Weak liquidity ratio ({:.2})", cr));
    }
    if !technical.is_liquid() {
        out.push("Low trading volume".to_string());
    }
    if let Some(vol) = technical.volatility.annualized.filter(|v| *v > 80.0) {
        out.push(format!("High volatility ({:.1}%)", vol));
    }
    if technical.overall_signal == Signal::Sell {
        out.push("Bearish technical signals".to_string());
    }

    out.truncate(MAX_REASONS);
    out
}

pub fn rationale(
    overall: f64,
    profile: &ProfileAnalysis,
    fundamental: &FundamentalAnalysis,
    technical: &TechnicalAnalysis,
    strengths: &[String],
) -> String {
    let category = InvestmentCategory::from_score(overall);
    let mut parts = vec![format!(
        "Overall score of {:.1}/10 indicates a {} investment opportunity.",
        overall,
        category.as_str().to_lowercase()
    )];

    let best = profile
        .profile_score
        .max(fundamental.fundamental_score)
        .max(technical.technical_score);
    if best == fundamental.fundamental_score {
        parts.push("Fundamentals are the strongest factor.".to_string());
    } else if best == technical.technical_score {
        parts.push("Technical indicators are the strongest factor.".to_string());
    } else {
        parts.push("Company profile is the strongest factor.".to_string());
    }

    if !technical.is_liquid() {
        parts.push("Low liquidity is a significant concern.".to_string());
    }
    if profile.red_flags.len() > 2 {
        parts.push(format!(
            "Multiple red flags identified ({}).",
            profile.red_flags.len()
        ));
    }
    if strengths.len() >= 3 {
        parts.push(format!("Multiple strengths: {}.", strengths[..2].join(", ")));
    }

    parts.join(" ")
}

// ============================================================================
// Score card
// ============================================================================

/// Human-readable "score/10 (weight%)" per component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub company_profile: String,
    pub fundamental_analysis: String,
    pub technical_analysis: String,
    pub risk_factors: String,
}

impl ScoreBreakdown {
    fn new(c: &ScoreComponents, w: &ScoringWeights) -> Self {
        let line = |score: f64, weight: f64| format!("{:.1}/10 ({:.0}%)", score, weight);
        Self {
            company_profile: line(c.profile, w.profile),
            fundamental_analysis: line(c.fundamental, w.fundamental),
            technical_analysis: line(c.technical, w.technical),
            risk_factors: line(c.risk, w.risk),
        }
    }
}

/// Final verdict for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub symbol: String,
    pub company_name: String,
    pub analysis_date: NaiveDate,
    pub scores: ScoreComponents,
    pub overall_score: f64,
    pub category: InvestmentCategory,
    pub recommendation: Recommendation,
    pub eligibility: Eligibility,
    pub confidence: Confidence,
    pub risk_level: String,
    pub return_potential: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_category: MarketCapCategory,
    pub is_liquid: bool,
    pub red_flag_count: usize,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub rationale: String,
    pub score_breakdown: ScoreBreakdown,
}

fn within_range(
    range: &PriceRange,
    profile: &ProfileAnalysis,
    technical: &TechnicalAnalysis,
) -> bool {
    match profile.current_price {
        Some(_) => profile.within_price_range,
        None => technical.current_price.is_some_and(|p| range.contains(p)),
    }
}

/// Combine the three analyses into a score card
pub fn score_card(
    profile: &ProfileAnalysis,
    fundamental: &FundamentalAnalysis,
    technical: &TechnicalAnalysis,
    config: &AppConfig,
) -> ScoreCard {
    let weights = &config.scoring_weights;
    let scores = ScoreComponents::new(
        profile.profile_score,
        fundamental.fundamental_score,
        technical.technical_score,
        risk_score(profile, fundamental, technical),
    );
    let overall = overall_score(&scores, weights);
    let in_range = within_range(&config.price_range, profile, technical);
    let strengths = strengths(profile, fundamental, technical);

    ScoreCard {
        symbol: profile.symbol.clone(),
        company_name: profile.company_name.clone(),
        analysis_date: Utc::now().date_naive(),
        scores,
        overall_score: overall,
        category: InvestmentCategory::from_score(overall),
        recommendation: Recommendation::from_score(overall),
        eligibility: eligibility(in_range, fundamental, technical),
        confidence: confidence(profile, fundamental, technical),
        risk_level: risk_level(scores.risk, profile, technical),
        return_potential: return_potential(overall, fundamental, technical),
        current_price: profile.current_price.or(technical.current_price),
        market_cap: profile.market_cap,
        market_cap_category: profile.market_cap_category,
        is_liquid: technical.is_liquid(),
        red_flag_count: profile.red_flags.len(),
        weaknesses: weaknesses(profile, fundamental, technical),
        rationale: rationale(overall, profile, fundamental, technical, &strengths),
        strengths,
        score_breakdown: ScoreBreakdown::new(&scores, weights),
    }
}
