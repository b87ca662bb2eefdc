//! Per-symbol analyzers
//!
//! Each analyzer is a pure function from validated provider data to an
//! analysis record carrying a 0-10 sub-score:
//!
//! - **Profile** - company facts and red flags
//! - **Fundamental** - ratios, growth and valuation bands
//! - **Technical** - indicators, trends, volume and signals over price history
//!
//! The risk sub-score and the overall weighting live in [`crate::scoring`].

pub mod fundamental;
pub mod indicators;
pub mod profile;
pub mod technical;

pub use fundamental::{analyze_fundamentals, FundamentalAnalysis};
pub use profile::{analyze_profile, MarketCapCategory, ProfileAnalysis, RedFlag};
pub use technical::{analyze_technical, Signal, TechnicalAnalysis, TrendDirection};

/// Clamp a score into [0, 10]
pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 10.0)
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
