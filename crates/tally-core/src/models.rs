//! Domain models for the expense tracker

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single line on a receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub name: String,
    pub price: Decimal,
}

/// Structured expense extracted from OCR text
///
/// Immutable once created; it has no identity beyond its position in whatever
/// collection holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Receipts often omit a legible date
    pub date: Option<NaiveDate>,
    pub amount: Decimal,
    pub items: Vec<ReceiptItem>,
}

/// Spending categories used by the sample generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Groceries,
    Transport,
    Dining,
    Utilities,
    Entertainment,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 6] = [
        Self::Groceries,
        Self::Transport,
        Self::Dining,
        Self::Utilities,
        Self::Entertainment,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groceries => "groceries",
            Self::Transport => "transport",
            Self::Dining => "dining",
            Self::Utilities => "utilities",
            Self::Entertainment => "entertainment",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for ExpenseCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groceries" => Ok(Self::Groceries),
            "transport" => Ok(Self::Transport),
            "dining" => Ok(Self::Dining),
            "utilities" => Ok(Self::Utilities),
            "entertainment" => Ok(Self::Entertainment),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown expense category: {}", s)),
        }
    }
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A generated expense used in sample mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleExpense {
    pub date: NaiveDate,
    pub category: ExpenseCategory,
    pub description: String,
    pub amount: Decimal,
}

/// Whether calendar values are percentages or currency sums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarMode {
    /// Expense and income are complementary shares of 100
    Percentage,
    /// Expense and income are independent currency sums
    Amount,
}

/// One calendar cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAggregate {
    /// Day of month, 1..=31
    pub day: u32,
    pub expense: Decimal,
    pub income: Decimal,
}

/// A month of calendar cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCalendar {
    pub month: u32,
    pub year: i32,
    pub mode: CalendarMode,
    pub days: Vec<DailyAggregate>,
}

/// Spending for one weekday of one week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTotal {
    /// Short weekday label, "Mon".."Sun"
    pub day: String,
    pub expenses: Decimal,
}

/// Side-by-side weekday totals for the two weeks being compared
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekComparison {
    pub day: String,
    pub week1: Decimal,
    pub week2: Decimal,
}

/// Chart-ready totals for the first two weeks of a month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyTotals {
    pub week1: Vec<DayTotal>,
    pub week2: Vec<DayTotal>,
    pub comparison: Vec<WeekComparison>,
}

/// One recorded expense in the running ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// When the expense was recorded
    pub recorded_at: DateTime<Utc>,
    /// Date the expense applies to (receipt date, or the recording day)
    pub date: NaiveDate,
    /// Amount of this expense
    pub delta: Decimal,
    /// Running total after this entry
    pub total: Decimal,
    pub principal: Decimal,
    /// principal - total
    pub remaining: Decimal,
    /// Running count after this entry
    pub count: u64,
}

/// Current ledger state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub total: Decimal,
    pub balance: Decimal,
    pub count: u64,
}

/// Receipt text that failed to parse, held for a human to look at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewItem {
    /// SHA-256 of the text, hex encoded
    pub hash: String,
    pub text: String,
    pub reason: String,
    pub received_at: DateTime<Utc>,
}
