//! Sample data command

use anyhow::{bail, Result};
use chrono::{Datelike, Local};

use tally_core::sample::{month_expenses, percentage_calendar, weekly_totals};
use tally_core::AppConfig;

use crate::cli::SampleView;

pub fn cmd_sample(
    config: &AppConfig,
    month: Option<u32>,
    year: Option<i32>,
    seed: Option<u64>,
    view: SampleView,
) -> Result<()> {
    let today = Local::now().date_naive();
    let month = month.unwrap_or(today.month());
    let year = year.unwrap_or(today.year());
    let seed = seed.unwrap_or(config.sample.default_seed);

    if !(1..=12).contains(&month) {
        bail!("Month must be between 1 and 12, got {}", month);
    }

    println!("🎲 Sample data for {}-{:02} (seed {})", year, month, seed);
    println!();

    match view {
        SampleView::Calendar => {
            let calendar = percentage_calendar(
                seed,
                year,
                month,
                config.sample.percent_min,
                config.sample.percent_max,
            )?;
            println!("   {:>3}  {:>8}  {:>8}", "Day", "Expense", "Income");
            println!("   ─────────────────────────");
            for cell in &calendar.days {
                println!(
                    "   {:>3}  {:>7}%  {:>7}%",
                    cell.day, cell.expense, cell.income
                );
            }
        }
        SampleView::Weekly => {
            let expenses = month_expenses(seed, year, month)?;
            let totals = weekly_totals(expenses.iter().map(|e| (e.date, e.amount)), year, month)?;
            println!("   {:<4} {:>10} {:>10}", "Day", "Week 1", "Week 2");
            println!("   ─────────────────────────");
            for row in &totals.comparison {
                println!("   {:<4} {:>10} {:>10}", row.day, row.week1, row.week2);
            }
        }
        SampleView::Expenses => {
            let expenses = month_expenses(seed, year, month)?;
            for expense in &expenses {
                println!(
                    "   {}  {:<14} {:<28} {:>8}",
                    expense.date,
                    expense.category.as_str(),
                    expense.description,
                    expense.amount
                );
            }
            println!("   ─────────────────────────");
            println!("   {} expense(s)", expenses.len());
        }
    }

    Ok(())
}
