//! Tally CLI - Stock scoring and expense tracking
//!
//! Usage:
//!   tally analyze RELIANCE TCS        Score symbols, print a ranked summary
//!   tally analyze -f nifty50.csv -r   Score a symbol file, write JSON reports and a CSV
//!   tally receipt scan.txt --record   Parse OCR text and add the total to the ledger
//!   tally sample --month 3            Print deterministic sample data
//!   tally serve --port 5000           Start the expense tracker web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;
use tally_core::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > output.log_level > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else if let Some(level) = &config.output.log_level {
        EnvFilter::new(level)
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Analyze {
            symbols,
            file,
            column,
            reports,
            output,
            provider,
            top,
            min_score,
            liquid_only,
        } => {
            let opts = commands::AnalyzeOptions {
                symbols,
                file,
                column,
                reports,
                output,
                provider,
                top,
                min_score,
                liquid_only,
            };
            commands::cmd_analyze(config, &opts).await
        }
        Commands::Serve {
            port,
            host,
            ledger,
            static_dir,
            allowed_origins,
        } => {
            commands::cmd_serve(
                config,
                &host,
                port,
                ledger,
                static_dir.as_deref(),
                allowed_origins,
            )
            .await
        }
        Commands::Receipt {
            file,
            record,
            ledger,
            json,
        } => commands::cmd_receipt(config, &file, record, ledger, json),
        Commands::Sample {
            month,
            year,
            seed,
            view,
        } => commands::cmd_sample(&config, month, year, seed, view),
    }
}
