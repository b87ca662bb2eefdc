//! Receipt parsing command

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use tally_core::{parse_receipt, AppConfig, LedgerStore};

use super::open_ledger;

pub fn cmd_receipt(
    config: AppConfig,
    file: &Path,
    record: bool,
    ledger: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let parsed = parse_receipt(&text)
        .with_context(|| format!("Could not parse receipt text in {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        println!("🧾 Receipt: {}", file.display());
        println!("   Total:  {}", parsed.amount.round_dp(2));
        match parsed.date {
            Some(date) => println!("   Date:   {}", date),
            None => println!("   Date:   (not found, today will be used)"),
        }
        if !parsed.items.is_empty() {
            println!("   Items:");
            for item in &parsed.items {
                println!("   • {:<30} {:>10}", item.name, item.price.round_dp(2));
            }
        }
    }

    if record {
        let ledger = open_ledger(&config, ledger)?;
        let snapshot = ledger
            .add_expense(parsed.amount, parsed.date)
            .context("Failed to record expense")?;
        println!();
        println!(
            "✅ Recorded in {} (balance {}, {} expense(s))",
            ledger.path().display(),
            snapshot.balance.round_dp(2),
            snapshot.count
        );
    }

    Ok(())
}
