//! Tally Core Library
//!
//! Shared functionality for the Tally expense tracker and stock scorer:
//! - Receipt parsing from OCR text
//! - Pluggable OCR engines (tesseract, Ollama vision)
//! - Deterministic sample data and chart aggregates
//! - Expense ledger with in-memory and CSV stores
//! - Market data providers with ingestion validation
//! - Profile, fundamental and technical analyzers
//! - Weighted scoring and recommendation bands
//! - Concurrent batch analysis and report output

pub mod analysis;
pub mod analyzer;
pub mod config;
pub mod error;
pub mod ledger;
pub mod market;
pub mod models;
pub mod ocr;
pub mod receipt;
pub mod report;
pub mod review;
pub mod sample;
pub mod scoring;

pub use analysis::{
    FundamentalAnalysis, MarketCapCategory, ProfileAnalysis, RedFlag, Signal, TechnicalAnalysis,
};
pub use analyzer::{
    filter_by, score_cards, top_picks, Analyzer, BatchSummary, CardFilter, SymbolAnalysis,
    SymbolOutcome,
};
pub use config::{AppConfig, Exchange, OcrBackendKind, PriceRange, ProviderKind};
pub use error::{ConfigError, Error, ParseError, Result};
pub use ledger::{CsvLedger, LedgerStore, MemoryLedger};
pub use market::{
    CompanyInfo, FixtureMarketData, Fundamentals, HttpMarketData, MarketDataClient,
    MarketDataProvider, MockMarketData, PriceBar, SymbolSnapshot,
};
pub use models::{
    CalendarMode, DailyAggregate, ExpenseCategory, ExpenseRecord, LedgerEntry, LedgerSnapshot,
    MonthCalendar, ReceiptItem, ReviewItem, SampleExpense, WeeklyTotals,
};
pub use ocr::{MockOcr, OcrClient, OcrEngine, OllamaOcr, TesseractOcr};
pub use receipt::parse_receipt;
pub use review::ReviewQueue;
pub use scoring::{
    overall_score, Confidence, Eligibility, InvestmentCategory, Recommendation, ScoreCard,
    ScoreComponents, ScoringWeights,
};
