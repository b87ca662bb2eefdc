//! Company profile checks and red flags

use std::fmt;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::market::CompanyInfo;

use super::{clamp_score, round2};

const HIGH_RISK_SECTORS: [&str; 2] = ["Real Estate", "Construction"];

/// One crore, the unit Indian market-cap bands are quoted in
const CRORE: f64 = 10_000_000.0;

/// Something in the profile worth warning about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RedFlag {
    LowPromoterHolding(f64),
    LowMarketCap(f64),
    HighGovernanceRisk(f64),
    LimitedInformation,
    HighRiskSector(String),
    LowPublicFloat(f64),
}

impl fmt::Display for RedFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedFlag::LowPromoterHolding(p) => write!(f, "Low promoter holding ({:.1}%)", p),
            RedFlag::LowMarketCap(cap) => {
                write!(f, "Very low market cap ({})", format_indian_currency(*cap))
            }
            RedFlag::HighGovernanceRisk(r) => write!(f, "High governance risk score ({})", r),
            RedFlag::LimitedInformation => write!(f, "Limited company information available"),
            RedFlag::HighRiskSector(s) => write!(f, "High-risk sector: {}", s),
            RedFlag::LowPublicFloat(p) => write!(f, "Very low public float ({:.1}%)", p),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarketCapCategory {
    #[serde(rename = "Large Cap")]
    Large,
    #[serde(rename = "Mid Cap")]
    Mid,
    #[serde(rename = "Small Cap")]
    Small,
    #[serde(rename = "Micro Cap")]
    Micro,
    #[default]
    Unknown,
}

impl MarketCapCategory {
    /// Bands in crores: 20000+ large, 5000+ mid, 500+ small, else micro
    pub fn from_market_cap(market_cap: Option<f64>) -> Self {
        match market_cap.map(|cap| cap / CRORE) {
            None => Self::Unknown,
            Some(cr) if cr >= 20_000.0 => Self::Large,
            Some(cr) if cr >= 5_000.0 => Self::Mid,
            Some(cr) if cr >= 500.0 => Self::Small,
            Some(_) => Self::Micro,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Large => "Large Cap",
            Self::Mid => "Mid Cap",
            Self::Small => "Small Cap",
            Self::Micro => "Micro Cap",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for MarketCapCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Amount in lakh/crore notation: `₹12.50 Cr`, `₹3.20 L`, `₹4.00 K`
pub fn format_indian_currency(amount: f64) -> String {
    let abs = amount.abs();
    if !amount.is_finite() || amount == 0.0 {
        "₹0".to_string()
    } else if abs >= CRORE {
        format!("₹{:.2} Cr", amount / CRORE)
    } else if abs >= 100_000.0 {
        format!("₹{:.2} L", amount / 100_000.0)
    } else if abs >= 1_000.0 {
        format!("₹{:.2} K", amount / 1_000.0)
    } else {
        format!("₹{:.2}", amount)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileAnalysis {
    pub symbol: String,
    pub company_name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub market_cap_category: MarketCapCategory,
    pub current_price: Option<f64>,
    pub business_summary: Option<String>,
    pub promoter_holding: Option<f64>,
    pub institutional_holding: Option<f64>,
    pub governance_risk: Option<f64>,
    pub red_flags: Vec<RedFlag>,
    pub profile_score: f64,
    pub within_price_range: bool,
    pub analysis_date: Option<NaiveDate>,
}

pub fn analyze_profile(info: &CompanyInfo, config: &AppConfig) -> ProfileAnalysis {
    let red_flags = identify_red_flags(info, config);
    let profile_score = profile_score(info, &red_flags, config.fundamental_thresholds.min_market_cap);
    let within_price_range = info
        .current_price
        .is_some_and(|p| config.price_range.contains(p));

    tracing::debug!(
        symbol = %info.symbol,
        score = profile_score,
        red_flags = red_flags.len(),
        "Profile analysis complete"
    );

    ProfileAnalysis {
        symbol: info.symbol.clone(),
        company_name: info.name.clone().unwrap_or_else(|| "N/A".to_string()),
        sector: info.sector.clone(),
        industry: info.industry.clone(),
        market_cap: info.market_cap,
        market_cap_category: MarketCapCategory::from_market_cap(info.market_cap),
        current_price: info.current_price,
        business_summary: info.business_summary.clone(),
        promoter_holding: info.promoter_holding,
        institutional_holding: info.institutional_holding,
        governance_risk: info.governance_risk,
        red_flags,
        profile_score,
        within_price_range,
        analysis_date: Some(Utc::now().date_naive()),
    }
}

pub fn identify_red_flags(info: &CompanyInfo, config: &AppConfig) -> Vec<RedFlag> {
    let mut flags = Vec::new();

    if let Some(holding) = info.promoter_holding {
        if holding < config.risk_flags.min_promoter_holding {
            flags.push(RedFlag::LowPromoterHolding(holding));
        }
    }
    if let Some(cap) = info.market_cap {
        if cap < config.fundamental_thresholds.min_market_cap {
            flags.push(RedFlag::LowMarketCap(cap));
        }
    }
    if let Some(risk) = info.governance_risk {
        if risk > 7.0 {
            flags.push(RedFlag::HighGovernanceRisk(risk));
        }
    }
    if info.business_summary.is_none() {
        flags.push(RedFlag::LimitedInformation);
    }
    if let Some(sector) = &info.sector {
        if HIGH_RISK_SECTORS.contains(&sector.as_str()) {
            flags.push(RedFlag::HighRiskSector(sector.clone()));
        }
    }
    if let (Some(float), Some(outstanding)) = (info.float_shares, info.shares_outstanding) {
        if outstanding > 0.0 {
            let ratio = float / outstanding * 100.0;
            if ratio < 10.0 {
                flags.push(RedFlag::LowPublicFloat(ratio));
            }
        }
    }

    flags
}

/// Start at 10, lose 1.5 per red flag, then adjust for holding, size,
/// disclosure and governance
pub fn profile_score(info: &CompanyInfo, red_flags: &[RedFlag], min_market_cap: f64) -> f64 {
    let mut score = 10.0 - red_flags.len() as f64 * 1.5;

    if let Some(holding) = info.promoter_holding {
        if (30.0..=75.0).contains(&holding) {
            score += 1.0;
        } else if holding < 20.0 {
            score -= 1.0;
        }
    }
    if info.market_cap.is_some_and(|cap| cap >= min_market_cap * 2.0) {
        score += 0.5;
    }
    if info
        .business_summary
        .as_ref()
        .is_some_and(|s| s.chars().count() > 100)
    {
        score += 0.5;
    }
    if let Some(risk) = info.governance_risk {
        if risk <= 5.0 {
            score += 1.0;
        } else if risk >= 8.0 {
            score -= 1.0;
        }
    }

    round2(clamp_score(score))
}
