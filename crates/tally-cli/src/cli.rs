//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Score stocks and track expenses
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Stock scoring and personal expense tracking", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.config/tally/config.toml, then built-in defaults)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score a batch of stock symbols
    Analyze {
        /// Symbols to analyze (e.g. RELIANCE TCS INFY)
        symbols: Vec<String>,

        /// Read symbols from a CSV (symbol column) or a plain list, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Column holding symbols when --file is a CSV
        #[arg(long, default_value = "symbol")]
        column: String,

        /// Write a JSON report per scored symbol
        ///
        /// A single symbol always gets a report.
        #[arg(short, long)]
        reports: bool,

        /// Combined score CSV path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Market data provider override (http, fixture, mock)
        #[arg(long)]
        provider: Option<String>,

        /// Number of top picks to list
        #[arg(long, default_value = "5")]
        top: usize,

        /// Only list picks scoring at least this much
        #[arg(long)]
        min_score: Option<f64>,

        /// Only list liquid stocks among the picks
        #[arg(long)]
        liquid_only: bool,
    },

    /// Start the expense tracker web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "5000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// CSV ledger file (overrides ledger.path; in-memory when neither is set)
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Directory containing static files to serve (e.g., frontend/build)
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Allowed CORS origin (repeatable)
        #[arg(long = "allow-origin")]
        allowed_origins: Vec<String>,
    },

    /// Parse OCR text from a file into an expense
    Receipt {
        /// Text file holding OCR output
        file: PathBuf,

        /// Add the parsed total to the ledger
        #[arg(long)]
        record: bool,

        /// CSV ledger file (overrides ledger.path)
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Print the parsed record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print deterministic sample data for a month
    Sample {
        /// Month (1-12, defaults to current)
        #[arg(short, long)]
        month: Option<u32>,

        /// Year (defaults to current)
        #[arg(short, long)]
        year: Option<i32>,

        /// Seed (defaults to sample.default_seed)
        #[arg(short, long)]
        seed: Option<u64>,

        /// What to print
        #[arg(long, value_enum, default_value = "calendar")]
        view: SampleView,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SampleView {
    /// Expense/income percentages per day
    Calendar,
    /// Weekday totals for the first two weeks
    Weekly,
    /// Individual generated expenses
    Expenses,
}
