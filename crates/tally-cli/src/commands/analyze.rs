//! Batch analysis command

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use tracing::info;

use tally_core::analyzer::{filter_by, score_cards, top_picks};
use tally_core::config::ProviderKind;
use tally_core::market::load_symbols;
use tally_core::report::{scores_file_name, write_scores_csv, write_symbol_report};
use tally_core::{AppConfig, Analyzer, BatchSummary, CardFilter, MarketDataClient, SymbolOutcome};

use super::truncate;

/// Options for `tally analyze`
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub symbols: Vec<String>,
    pub file: Option<PathBuf>,
    pub column: String,
    pub reports: bool,
    pub output: Option<PathBuf>,
    pub provider: Option<String>,
    pub top: usize,
    pub min_score: Option<f64>,
    pub liquid_only: bool,
}

/// Symbols from the command line followed by those in `--file`
pub fn collect_symbols(opts: &AnalyzeOptions) -> Result<Vec<String>> {
    let mut symbols = opts.symbols.clone();
    if let Some(path) = &opts.file {
        let from_file = load_symbols(path, &opts.column)
            .with_context(|| format!("Failed to read symbols from {}", path.display()))?;
        info!(count = from_file.len(), file = %path.display(), "Loaded symbols");
        symbols.extend(from_file);
    }
    Ok(symbols)
}

pub async fn cmd_analyze(mut config: AppConfig, opts: &AnalyzeOptions) -> Result<()> {
    let symbols = collect_symbols(opts)?;
    if symbols.is_empty() {
        bail!("No symbols to analyze. Pass symbols or --file");
    }

    if let Some(kind) = &opts.provider {
        config.provider.kind = kind.parse::<ProviderKind>().map_err(anyhow::Error::msg)?;
    }

    let client =
        MarketDataClient::from_config(&config.provider).context("Failed to set up market data")?;
    let report_dir = config.output.report_directory.clone();
    let analyzer = Analyzer::new(client, Arc::new(config));

    println!(
        "🔍 Analyzing {} symbol(s) via {} provider...",
        symbols.len(),
        analyzer.config().provider.kind
    );

    let outcomes = analyzer.analyze_batch(&symbols).await;
    print_outcomes(&outcomes);

    let summary = BatchSummary::from_outcomes(&outcomes);
    print_summary(&summary);

    let cards = score_cards(&outcomes);
    let filter = CardFilter {
        min_score: opts.min_score,
        liquid_only: opts.liquid_only,
        ..CardFilter::default()
    };
    let picks = top_picks(&filter_by(&cards, &filter), opts.top);
    if !picks.is_empty() {
        println!();
        println!("⭐ Top picks:");
        for (i, card) in picks.iter().enumerate() {
            println!(
                "   {}. {} ({:.2}) {} - {}",
                i + 1,
                card.symbol,
                card.overall_score,
                card.recommendation,
                card.return_potential
            );
        }
    }

    // A lone symbol always gets its detailed report
    if opts.reports || outcomes.len() == 1 {
        let mut written = 0;
        for outcome in &outcomes {
            if let SymbolOutcome::Scored(analysis) = outcome {
                let path = write_symbol_report(&report_dir, analysis)
                    .with_context(|| format!("Failed to write report for {}", outcome.symbol()))?;
                info!(path = %path.display(), "Report written");
                written += 1;
            }
        }
        if written > 0 {
            println!();
            println!("📄 {} report(s) written to {}", written, report_dir.display());
        }
    }

    let csv_path = match &opts.output {
        Some(path) => Some(path.clone()),
        None if opts.reports && cards.len() > 1 => {
            Some(report_dir.join(scores_file_name(Local::now().naive_local())))
        }
        None => None,
    };
    if let Some(path) = csv_path {
        write_scores_csv(&path, &cards)
            .with_context(|| format!("Failed to write scores to {}", path.display()))?;
        println!("📊 Scores written to {}", path.display());
    }

    if summary.scored == 0 {
        bail!("No symbol could be analyzed");
    }

    Ok(())
}

fn print_outcomes(outcomes: &[SymbolOutcome]) {
    println!();
    println!(
        "   {:<14} {:<28} {:>6}  {:<18} {}",
        "Symbol", "Company", "Score", "Recommendation", "Eligibility"
    );
    println!("   {}", "─".repeat(84));
    for outcome in outcomes {
        match outcome {
            SymbolOutcome::Scored(analysis) => {
                let card = &analysis.score_card;
                println!(
                    "   {:<14} {:<28} {:>6.2}  {:<18} {}",
                    card.symbol,
                    truncate(&card.company_name, 28),
                    card.overall_score,
                    card.recommendation.as_str(),
                    card.eligibility.as_str()
                );
            }
            SymbolOutcome::Failed { symbol, error } => {
                println!("   {:<14} ❌ {}", symbol, error);
            }
        }
    }
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("📊 Batch summary");
    println!("   ─────────────────────────────");
    println!(
        "   Analyzed:   {} of {} ({} failed)",
        summary.scored, summary.total, summary.failed
    );
    if let (Some(avg), Some(median), Some(max), Some(min)) = (
        summary.average_score,
        summary.median_score,
        summary.max_score,
        summary.min_score,
    ) {
        println!("   Average:    {:.2}", avg);
        println!("   Median:     {:.2}", median);
        println!("   Range:      {:.2} - {:.2}", min, max);
    }
    if !summary.category_distribution.is_empty() {
        println!();
        println!("   By category:");
        for (category, count) in &summary.category_distribution {
            println!("   • {:<24} {}", category, count);
        }
    }
}
