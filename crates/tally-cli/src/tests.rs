//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use tally_core::config::ProviderKind;
use tally_core::{AppConfig, CsvLedger, LedgerStore};

use crate::cli::SampleView;
use crate::commands::{self, collect_symbols, truncate, AnalyzeOptions};

fn mock_config(report_dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.provider.kind = ProviderKind::Mock;
    config.output.report_directory = report_dir.to_path_buf();
    config
}

fn options(symbols: &[&str]) -> AnalyzeOptions {
    AnalyzeOptions {
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        column: "symbol".to_string(),
        top: 5,
        ..AnalyzeOptions::default()
    }
}

fn files_with_prefix(dir: &Path, prefix: &str, ext: &str) -> usize {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| {
                    let name = e.file_name().to_string_lossy().to_string();
                    name.starts_with(prefix) && name.ends_with(ext)
                })
                .count()
        })
        .unwrap_or(0)
}

// ========== Analyze Command Tests ==========

#[test]
fn test_collect_symbols_merges_args_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("watch.csv");
    fs::write(&path, "Symbol,Name\nINFY,Infosys\n,blank\nTCS,Tata\n").unwrap();

    let mut opts = options(&["RELIANCE"]);
    opts.file = Some(path);

    let symbols = collect_symbols(&opts).unwrap();
    assert_eq!(symbols, vec!["RELIANCE", "INFY", "TCS"]);
}

#[test]
fn test_collect_symbols_missing_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("watch.csv");
    fs::write(&path, "ticker\nINFY\n").unwrap();

    let mut opts = options(&[]);
    opts.file = Some(path);

    assert!(collect_symbols(&opts).is_err());
}

#[tokio::test]
async fn test_cmd_analyze_single_symbol_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = mock_config(dir.path());

    commands::cmd_analyze(config, &options(&["INFY"])).await.unwrap();

    assert_eq!(files_with_prefix(dir.path(), "INFY_report_", ".json"), 1);
    assert_eq!(files_with_prefix(dir.path(), "stock_scores_", ".csv"), 0);
}

#[tokio::test]
async fn test_cmd_analyze_batch_with_reports() {
    let dir = tempfile::tempdir().unwrap();
    let config = mock_config(dir.path());

    let mut opts = options(&["INFY", "TCS", "WIPRO"]);
    opts.reports = true;
    commands::cmd_analyze(config, &opts).await.unwrap();

    assert_eq!(files_with_prefix(dir.path(), "", ".json"), 3);
    assert_eq!(files_with_prefix(dir.path(), "stock_scores_", ".csv"), 1);
}

#[tokio::test]
async fn test_cmd_analyze_explicit_csv_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = mock_config(&dir.path().join("reports"));
    let csv_path = dir.path().join("out").join("scores.csv");

    let mut opts = options(&["INFY", "TCS"]);
    opts.output = Some(csv_path.clone());
    opts.min_score = Some(0.0);
    commands::cmd_analyze(config, &opts).await.unwrap();

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    assert_eq!(reader.records().count(), 2);
    // No --reports and more than one symbol: no JSON reports
    assert!(!dir.path().join("reports").exists());
}

#[tokio::test]
async fn test_cmd_analyze_requires_symbols() {
    let dir = tempfile::tempdir().unwrap();
    let result = commands::cmd_analyze(mock_config(dir.path()), &options(&[])).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_cmd_analyze_rejects_unknown_provider() {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = options(&["INFY"]);
    opts.provider = Some("carrier-pigeon".to_string());

    let result = commands::cmd_analyze(mock_config(dir.path()), &opts).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_cmd_analyze_fails_when_nothing_scored() {
    let dir = tempfile::tempdir().unwrap();
    // Only invalid symbols: every unit is rejected before any lookup
    let result = commands::cmd_analyze(mock_config(dir.path()), &options(&["$$$", "   "])).await;
    assert!(result.is_err());
}

// ========== Receipt Command Tests ==========

const RECEIPT: &str = "FRESH MART\n14/05/2024\nMilk 2.50\nBread 3.25\nSubtotal 5.75\nTotal 6.10\n";

#[test]
fn test_cmd_receipt_parses_without_recording() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("receipt.txt");
    fs::write(&file, RECEIPT).unwrap();

    let result = commands::cmd_receipt(AppConfig::default(), &file, false, None, true);
    assert!(result.is_ok());
}

#[test]
fn test_cmd_receipt_records_to_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("receipt.txt");
    let ledger_path = dir.path().join("expenses.csv");
    fs::write(&file, RECEIPT).unwrap();

    commands::cmd_receipt(
        AppConfig::default(),
        &file,
        true,
        Some(ledger_path.clone()),
        false,
    )
    .unwrap();

    let ledger = CsvLedger::open(ledger_path, Decimal::new(10_000, 0)).unwrap();
    let snapshot = ledger.snapshot().unwrap();
    assert_eq!(snapshot.count, 1);
    assert_eq!(snapshot.total, Decimal::new(610, 2));
}

#[test]
fn test_cmd_receipt_record_needs_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("receipt.txt");
    fs::write(&file, RECEIPT).unwrap();

    let result = commands::cmd_receipt(AppConfig::default(), &file, true, None, false);
    assert!(result.is_err());
}

#[test]
fn test_cmd_receipt_without_total() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("receipt.txt");
    fs::write(&file, "blurry photo of a cat").unwrap();

    let result = commands::cmd_receipt(AppConfig::default(), &file, false, None, false);
    assert!(result.is_err());
}

#[test]
fn test_cmd_receipt_missing_file() {
    let result = commands::cmd_receipt(
        AppConfig::default(),
        Path::new("/nonexistent/receipt.txt"),
        false,
        None,
        false,
    );
    assert!(result.is_err());
}

// ========== Sample Command Tests ==========

#[test]
fn test_cmd_sample_views() {
    let config = AppConfig::default();
    for view in [SampleView::Calendar, SampleView::Weekly, SampleView::Expenses] {
        let result = commands::cmd_sample(&config, Some(2), Some(2024), Some(7), view);
        assert!(result.is_ok());
    }
}

#[test]
fn test_cmd_sample_invalid_month() {
    let config = AppConfig::default();
    let result = commands::cmd_sample(&config, Some(13), Some(2024), None, SampleView::Calendar);
    assert!(result.is_err());
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("Infosys", 10), "Infosys");
    assert_eq!(truncate("Tata Consultancy Services", 10), "Tata Co...");
    assert_eq!(truncate("", 5), "");
}

#[test]
fn test_open_ledger_prefers_override() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.ledger.path = Some(dir.path().join("configured.csv"));

    let override_path = dir.path().join("override.csv");
    let ledger = commands::open_ledger(&config, Some(override_path.clone())).unwrap();
    assert_eq!(ledger.path(), override_path.as_path());
}
