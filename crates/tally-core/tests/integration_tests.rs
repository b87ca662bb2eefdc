//! Integration tests for tally-core
//!
//! These tests exercise the OCR → parse → ledger flow and the
//! provider → analyze → score → report flow end to end.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use tally_core::{
    analyzer::{filter_by, score_cards, top_picks, BatchSummary, CardFilter},
    config::{AppConfig, Exchange, ProviderKind},
    ledger::{CsvLedger, LedgerStore},
    market::{CompanyInfo, Fundamentals, MarketDataClient, PriceBar, SymbolSnapshot},
    ocr::{OcrClient, OcrEngine},
    receipt::parse_receipt,
    report::{write_scores_csv, write_symbol_report},
    sample::{percentage_calendar, sample_unit},
    Analyzer, Recommendation, SymbolOutcome,
};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A steadily rising, liquid stock with healthy fundamentals
fn strong_snapshot(symbol: &str) -> SymbolSnapshot {
    let end = day(2024, 6, 28);
    let history = (0..260)
        .map(|i| {
            let close = 40.0 + i as f64 * 0.1;
            PriceBar::new(end - Duration::days(259 - i), close, 50_000.0)
        })
        .collect();

    SymbolSnapshot {
        company: CompanyInfo {
            symbol: symbol.to_string(),
            name: Some("Strong Industries".into()),
            sector: Some("Technology".into()),
            market_cap: Some(8.0e10),
            current_price: Some(65.9),
            business_summary: Some("Makes widgets for a very large number of customers ".repeat(3)),
            promoter_holding: Some(52.0),
            governance_risk: Some(2.0),
            ..Default::default()
        },
        fundamentals: Some(Fundamentals {
            symbol: symbol.to_string(),
            return_on_equity: Some(21.0),
            profit_margin: Some(12.0),
            current_ratio: Some(2.2),
            debt_to_equity: Some(0.3),
            revenue_growth: Some(18.0),
            earnings_growth: Some(22.0),
            trailing_pe: Some(14.0),
            total_revenue: Some(5.0e9),
            operating_cash_flow: Some(1.0e9),
            free_cash_flow: Some(4.0e8),
            ..Default::default()
        }),
        history,
    }
}

fn fixture_config(dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.market.exchange = Exchange::Plain;
    config.provider.kind = ProviderKind::Fixture;
    config.provider.fixture_dir = Some(dir.to_path_buf());
    config.analysis.concurrency = 2;
    config
}

// =============================================================================
// Receipt Flow
// =============================================================================

#[tokio::test]
async fn test_ocr_text_parses_and_lands_in_ledger() {
    let ocr = OcrClient::mock(
        "CORNER MARKET\n2024-05-14\nBread 3.25\nMilk 2 x 1.99\nSubtotal 7.23\nTax 0.58\nTotal: $42.50\n",
    );
    let text = ocr.extract_text(b"fake image").await.unwrap();
    let record = parse_receipt(&text).unwrap();

    assert_eq!(record.amount, Decimal::new(4250, 2));
    assert_eq!(record.date, Some(day(2024, 5, 14)));
    assert_eq!(record.items.len(), 2);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.csv");
    let ledger = CsvLedger::open(&path, Decimal::new(10_000, 0)).unwrap();
    let before = ledger.snapshot().unwrap();
    let after = ledger.add_expense(record.amount, record.date).unwrap();

    assert_eq!(before.balance - after.balance, record.amount);
    assert_eq!(after.count, 1);

    // Reopening the file restores the same state
    let reopened = CsvLedger::open(&path, Decimal::new(10_000, 0)).unwrap();
    assert_eq!(reopened.snapshot().unwrap(), after);
    assert_eq!(reopened.entries_in_month(2024, 5).unwrap().len(), 1);
}

// =============================================================================
// Sample Data
// =============================================================================

#[test]
fn test_sample_calendar_is_reproducible() {
    let a = percentage_calendar(7, 2024, 2, 20.0, 80.0).unwrap();
    let b = percentage_calendar(7, 2024, 2, 20.0, 80.0).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.days.len(), 29);
    assert!(a
        .days
        .iter()
        .all(|d| d.expense + d.income == Decimal::ONE_HUNDRED));

    for d in 0..500 {
        assert_eq!(sample_unit(99, d), sample_unit(99, d));
    }
}

// =============================================================================
// Scoring Flow
// =============================================================================

#[tokio::test]
async fn test_fixture_batch_scores_survivors_and_reports_failures() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("STRONG.json"),
        serde_json::to_string(&strong_snapshot("STRONG")).unwrap(),
    )
    .unwrap();

    let config = fixture_config(dir.path());
    let client = MarketDataClient::from_config(&config.provider).unwrap();
    let analyzer = Analyzer::new(client, Arc::new(config));

    let outcomes = analyzer.analyze_batch(&["strong", "MISSING"]).await;
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].symbol(), "STRONG");
    assert!(matches!(
        &outcomes[1],
        SymbolOutcome::Failed { symbol, .. } if symbol == "MISSING"
    ));

    let cards = score_cards(&outcomes);
    let card = cards[0];
    assert!(card.overall_score >= 6.0, "score was {}", card.overall_score);
    assert!(card.recommendation.is_buy());
    assert!(card.is_liquid);
    assert!(card.eligibility.is_eligible());
    assert!(card.strengths.len() <= 5);

    let summary = BatchSummary::from_outcomes(&outcomes);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.scored, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.max_score, Some(card.overall_score));

    assert_eq!(top_picks(&cards, 3).len(), 1);
    let filtered = filter_by(
        &cards,
        &CardFilter {
            min_score: Some(9.9),
            ..Default::default()
        },
    );
    assert!(filtered.is_empty() || filtered[0].overall_score >= 9.9);
}

#[tokio::test]
async fn test_reports_written_for_scored_symbols() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("STRONG.json"),
        serde_json::to_string(&strong_snapshot("STRONG")).unwrap(),
    )
    .unwrap();

    let config = fixture_config(dir.path());
    let client = MarketDataClient::from_config(&config.provider).unwrap();
    let analyzer = Analyzer::new(client, Arc::new(config));
    let analysis = analyzer.analyze_symbol("STRONG").await.unwrap();

    let out = tempfile::tempdir().unwrap();
    let report = write_symbol_report(&out.path().join("reports"), &analysis).unwrap();
    let name = report.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("STRONG_report_") && name.ends_with(".json"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["symbol"], "STRONG");
    assert!(json["score_card"]["overall_score"].is_number());

    let csv_path = out.path().join("scores.csv");
    write_scores_csv(&csv_path, &[&analysis.score_card]).unwrap();
    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "symbol");
    assert!(headers.iter().any(|h| h == "risk_score"));

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    let recommendation: Recommendation = rows[0][3].parse().unwrap();
    assert_eq!(recommendation, analysis.score_card.recommendation);
}
