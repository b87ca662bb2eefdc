//! Fundamental analysis: profitability, balance sheet health, growth and
//! valuation, folded into a 0-10 fundamental score.

use serde::{Deserialize, Serialize};

use crate::market::Fundamentals;

use super::{clamp_score, round2};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalAnalysis {
    pub symbol: String,
    pub metrics: Fundamentals,
    pub fundamental_score: f64,
    pub insights: Vec<String>,
    pub error: Option<String>,
}

impl FundamentalAnalysis {
    pub fn failed(symbol: &str, error: impl Into<String>) -> Self {
        Self {
            symbol: symbol.to_string(),
            metrics: Fundamentals {
                symbol: symbol.to_string(),
                ..Default::default()
            },
            fundamental_score: 0.0,
            insights: vec!["Data unavailable - analysis failed".to_string()],
            error: Some(error.into()),
        }
    }
}

pub fn analyze_fundamentals(data: &Fundamentals) -> FundamentalAnalysis {
    let fundamental_score = fundamental_score(data);
    tracing::debug!(symbol = %data.symbol, score = fundamental_score, "Fundamental analysis complete");

    FundamentalAnalysis {
        symbol: data.symbol.clone(),
        metrics: data.clone(),
        fundamental_score,
        insights: fundamental_insights(data),
        error: None,
    }
}

/// Start at 5 and adjust per metric band. Missing metrics adjust nothing.
pub fn fundamental_score(m: &Fundamentals) -> f64 {
    let mut score = 5.0;

    if let Some(roe) = m.return_on_equity {
        score += match roe {
            r if r >= 15.0 => 1.5,
            r if r >= 10.0 => 1.0,
            r if r >= 5.0 => 0.5,
            r if r < 0.0 => -1.0,
            _ => 0.0,
        };
    }
    if let Some(margin) = m.profit_margin {
        score += match margin {
            p if p >= 10.0 => 1.0,
            p if p >= 5.0 => 0.5,
            p if p < 0.0 => -1.0,
            _ => 0.0,
        };
    }

    if let Some(cr) = m.current_ratio {
        score += match cr {
            c if c >= 2.0 => 1.0,
            c if c >= 1.5 => 0.5,
            c if c < 1.0 => -0.5,
            _ => 0.0,
        };
    }
    if let Some(de) = m.debt_to_equity {
        score += match de {
            d if d <= 0.5 => 1.0,
            d if d <= 1.0 => 0.5,
            d if d >= 2.0 => -1.0,
            _ => 0.0,
        };
    }

    if let Some(growth) = m.revenue_growth {
        score += match growth {
            g if g >= 20.0 => 1.5,
            g if g >= 10.0 => 1.0,
            g if g >= 5.0 => 0.5,
            g if g < -10.0 => -1.0,
            _ => 0.0,
        };
    }
    if let Some(growth) = m.earnings_growth {
        score += match growth {
            g if g >= 20.0 => 1.0,
            g if g >= 10.0 => 0.5,
            g if g < -10.0 => -1.0,
            _ => 0.0,
        };
    }

    if let Some(pe) = m.trailing_pe {
        score += match pe {
            p if (5.0..=15.0).contains(&p) => 0.5,
            p if p < 5.0 => 0.2,
            p if p > 30.0 => -0.5,
            _ => 0.0,
        };
    }
    if let Some(pb) = m.price_to_book {
        if pb < 1.0 {
            score += 0.5;
        } else if pb > 3.0 {
            score -= 0.5;
        }
    }

    if m.operating_cash_flow.is_some_and(|ocf| ocf > 0.0) {
        score += 0.5;
        if m.free_cash_flow.is_some_and(|fcf| fcf > 0.0) {
            score += 0.5;
        }
    }

    round2(clamp_score(score))
}

fn fundamental_insights(m: &Fundamentals) -> Vec<String> {
    let mut insights = Vec::new();

    if let Some(roe) = m.return_on_equity {
        if roe >= 15.0 {
            insights.push(format!("Excellent ROE of {:.1}%", roe));
        } else if roe < 5.0 {
            insights.push(format!("Low ROE of {:.1}%", roe));
        }
    }
    if let Some(growth) = m.revenue_growth {
        if growth >= 15.0 {
            insights.push(format!("Strong revenue growth: {:.1}% YoY", growth));
        } else if growth < 0.0 {
            insights.push(format!("Declining revenue: {:.1}% YoY", growth));
        }
    }
    if let Some(de) = m.debt_to_equity {
        if de >= 2.0 {
            insights.push(format!("High debt-to-equity ratio: {:.2}", de));
        } else if de < 0.5 {
            insights.push(format!("Low debt levels: D/E = {:.2}", de));
        }
    }
    if let Some(cr) = m.current_ratio {
        if cr >= 2.0 {
            insights.push(format!("Strong liquidity: Current Ratio = {:.2}", cr));
        } else if cr < 1.0 {
            insights.push(format!("Weak liquidity: Current Ratio = {:.2}", cr));
        }
    }
    if let Some(yield_pct) = m.dividend_yield.filter(|y| *y > 0.0) {
        insights.push(format!("Pays dividends: {:.2}% yield", yield_pct));
    }
    if let Some(pe) = m.trailing_pe {
        if pe < 10.0 {
            insights.push(format!("Attractive P/E ratio: {:.1}", pe));
        } else if pe > 30.0 {
            insights.push(format!("High P/E ratio: {:.1}", pe));
        }
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_metrics_score_neutral() {
        assert_eq!(fundamental_score(&Fundamentals::default()), 5.0);
    }

    #[test]
    fn test_strong_company_clamped_to_ten() {
        let m = Fundamentals {
            return_on_equity: Some(22.0),
            profit_margin: Some(14.0),
            current_ratio: Some(2.4),
            debt_to_equity: Some(0.3),
            revenue_growth: Some(25.0),
            earnings_growth: Some(30.0),
            trailing_pe: Some(12.0),
            price_to_book: Some(0.8),
            operating_cash_flow: Some(1.0e8),
            free_cash_flow: Some(5.0e7),
            ..Default::default()
        };
        assert_eq!(fundamental_score(&m), 10.0);
    }

    #[test]
    fn test_mixed_metrics() {
        let m = Fundamentals {
            return_on_equity: Some(7.0),
            profit_margin: Some(-2.0),
            debt_to_equity: Some(1.2),
            trailing_pe: Some(3.0),
            operating_cash_flow: Some(1.0),
            free_cash_flow: Some(-1.0),
            ..Default::default()
        };
        // 5 + 0.5 - 1 + 0 + 0.2 + 0.5
        assert_eq!(fundamental_score(&m), 5.2);
    }

    #[test]
    fn test_failed_analysis_scores_zero() {
        let a = FundamentalAnalysis::failed("X.NS", "timeout");
        assert_eq!(a.fundamental_score, 0.0);
        assert_eq!(a.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_insights_mention_weak_liquidity() {
        let m = Fundamentals {
            current_ratio: Some(0.7),
            ..Default::default()
        };
        let a = analyze_fundamentals(&m);
        assert_eq!(a.insights, vec!["Weak liquidity: Current Ratio = 0.70"]);
    }
}
