//! Running expense ledger
//!
//! Balance and count are derived from an append-only list of entries held by a
//! [`LedgerStore`]. The server owns one store and hands it to handlers, so
//! there is no process-wide mutable state.
//!
//! - `MemoryLedger`: entries live in memory (tests, throwaway servers)
//! - `CsvLedger`: entries are appended to a CSV file and reloaded on open

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::RwLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{LedgerEntry, LedgerSnapshot};

const COL_TOTAL: &str = "Total Expenses";
const COL_PRINCIPAL: &str = "Principal Amount";
const COL_REMAINING: &str = "Remaining Amount";
const COL_COUNT: &str = "Expense Count";
const COL_TIMESTAMP: &str = "Timestamp";
const COL_DELTA: &str = "Delta";
const COL_DATE: &str = "Expense Date";

const HEADER: [&str; 7] = [
    COL_TOTAL,
    COL_PRINCIPAL,
    COL_REMAINING,
    COL_COUNT,
    COL_TIMESTAMP,
    COL_DELTA,
    COL_DATE,
];

/// Storage for the expense ledger
pub trait LedgerStore: Send + Sync {
    /// Starting balance expenses are deducted from
    fn principal(&self) -> Decimal;

    /// Every entry, oldest first
    fn entries(&self) -> Result<Vec<LedgerEntry>>;

    /// Record an expense; `date` defaults to today
    ///
    /// Amounts of zero or below are rejected with `Error::InvalidData`.
    fn add_expense(&self, amount: Decimal, date: Option<NaiveDate>) -> Result<LedgerSnapshot>;

    /// Current total, balance and count
    fn snapshot(&self) -> Result<LedgerSnapshot> {
        let entries = self.entries()?;
        Ok(snapshot_of(self.principal(), entries.last()))
    }

    /// Entries whose expense date falls in the given month
    fn entries_in_month(&self, year: i32, month: u32) -> Result<Vec<LedgerEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| e.date.year() == year && e.date.month() == month)
            .collect())
    }
}

fn snapshot_of(principal: Decimal, last: Option<&LedgerEntry>) -> LedgerSnapshot {
    match last {
        Some(entry) => LedgerSnapshot {
            total: entry.total,
            balance: principal - entry.total,
            count: entry.count,
        },
        None => LedgerSnapshot {
            total: Decimal::ZERO,
            balance: principal,
            count: 0,
        },
    }
}

fn next_entry(
    principal: Decimal,
    last: Option<&LedgerEntry>,
    amount: Decimal,
    date: Option<NaiveDate>,
) -> Result<LedgerEntry> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidData(
            "Amount must be greater than 0".to_string(),
        ));
    }

    let recorded_at = Utc::now();
    let (prev_total, prev_count) = last.map(|e| (e.total, e.count)).unwrap_or((Decimal::ZERO, 0));
    let total = prev_total + amount;

    Ok(LedgerEntry {
        recorded_at,
        date: date.unwrap_or_else(|| recorded_at.date_naive()),
        delta: amount,
        total,
        principal,
        remaining: principal - total,
        count: prev_count + 1,
    })
}

fn lock_error() -> Error {
    Error::InvalidData("Failed to acquire ledger lock".into())
}

/// In-memory ledger
pub struct MemoryLedger {
    principal: Decimal,
    entries: RwLock<Vec<LedgerEntry>>,
}

impl MemoryLedger {
    pub fn new(principal: Decimal) -> Self {
        Self {
            principal,
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl LedgerStore for MemoryLedger {
    fn principal(&self) -> Decimal {
        self.principal
    }

    fn entries(&self) -> Result<Vec<LedgerEntry>> {
        Ok(self.entries.read().map_err(|_| lock_error())?.clone())
    }

    fn add_expense(&self, amount: Decimal, date: Option<NaiveDate>) -> Result<LedgerSnapshot> {
        let mut entries = self.entries.write().map_err(|_| lock_error())?;
        let entry = next_entry(self.principal, entries.last(), amount, date)?;
        entries.push(entry);
        Ok(snapshot_of(self.principal, entries.last()))
    }
}

/// Append-only CSV ledger
///
/// Columns: Total Expenses, Principal Amount, Remaining Amount, Expense Count,
/// Timestamp, Delta, Expense Date. Files missing some of these columns still
/// load; rows without a usable total or timestamp are skipped. Such a file is
/// rewritten in the full layout on open, before anything is appended to it.
pub struct CsvLedger {
    path: PathBuf,
    principal: Decimal,
    entries: RwLock<Vec<LedgerEntry>>,
}

impl CsvLedger {
    /// Open (or lazily create) a ledger file
    pub fn open(path: impl Into<PathBuf>, principal: Decimal) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let (entries, current_layout) = load_entries(&path, principal)?;
            if !current_layout {
                rewrite(&path, &entries)?;
            }
            entries
        } else {
            Vec::new()
        };

        debug!(path = %path.display(), entries = entries.len(), "Opened CSV ledger");

        Ok(Self {
            path,
            principal,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, entry: &LedgerEntry) -> Result<()> {
        let needs_header = fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(HEADER)?;
        }
        writer.write_record(row(entry))?;
        writer.flush()?;
        Ok(())
    }
}

fn row(entry: &LedgerEntry) -> [String; 7] {
    [
        entry.total.to_string(),
        entry.principal.to_string(),
        entry.remaining.to_string(),
        entry.count.to_string(),
        entry.recorded_at.to_rfc3339(),
        entry.delta.to_string(),
        entry.date.to_string(),
    ]
}

/// Replace a file written with another column layout by the loaded entries
/// in the current layout, so appended rows line up with the header
fn rewrite(path: &Path, entries: &[LedgerEntry]) -> Result<()> {
    let staging = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&staging)?;
        writer.write_record(HEADER)?;
        for entry in entries {
            writer.write_record(row(entry))?;
        }
        writer.flush()?;
    }
    fs::rename(&staging, path)?;

    warn!(
        path = %path.display(),
        entries = entries.len(),
        "Rewrote ledger file with the current column layout"
    );
    Ok(())
}

impl LedgerStore for CsvLedger {
    fn principal(&self) -> Decimal {
        self.principal
    }

    fn entries(&self) -> Result<Vec<LedgerEntry>> {
        Ok(self.entries.read().map_err(|_| lock_error())?.clone())
    }

    fn add_expense(&self, amount: Decimal, date: Option<NaiveDate>) -> Result<LedgerSnapshot> {
        // Hold the write lock across the file append so rows stay ordered
        let mut entries = self.entries.write().map_err(|_| lock_error())?;
        let entry = next_entry(self.principal, entries.last(), amount, date)?;
        self.append(&entry)?;
        entries.push(entry);
        Ok(snapshot_of(self.principal, entries.last()))
    }
}

/// Entries from an existing file, and whether its header is the current one
///
/// An empty file counts as current: the first append writes the header.
fn load_entries(path: &Path, principal: Decimal) -> Result<(Vec<LedgerEntry>, bool)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let current_layout = headers.is_empty() || headers.iter().eq(HEADER.iter().copied());
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let total_idx = column(COL_TOTAL);
    let principal_idx = column(COL_PRINCIPAL);
    let count_idx = column(COL_COUNT);
    let timestamp_idx = column(COL_TIMESTAMP);
    let delta_idx = column(COL_DELTA);
    let date_idx = column(COL_DATE);

    let mut entries: Vec<LedgerEntry> = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let field = |idx: Option<usize>| idx.and_then(|i| record.get(i)).filter(|s| !s.is_empty());

        let total = field(total_idx).and_then(|s| Decimal::from_str(s).ok());
        let recorded_at = field(timestamp_idx).and_then(parse_timestamp);
        let (Some(total), Some(recorded_at)) = (total, recorded_at) else {
            warn!(path = %path.display(), row = row + 1, "Skipping ledger row without total or timestamp");
            continue;
        };

        let prev = entries.last();
        let row_principal = field(principal_idx)
            .and_then(|s| Decimal::from_str(s).ok())
            .unwrap_or(principal);
        let delta = field(delta_idx)
            .and_then(|s| Decimal::from_str(s).ok())
            .unwrap_or_else(|| total - prev.map(|e| e.total).unwrap_or(Decimal::ZERO));
        let count = field(count_idx)
            .and_then(|s| s.parse::<f64>().ok())
            .map(|c| c as u64)
            .unwrap_or_else(|| prev.map(|e| e.count).unwrap_or(0) + 1);
        let date = field(date_idx)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .unwrap_or_else(|| recorded_at.date_naive());

        entries.push(LedgerEntry {
            recorded_at,
            date,
            delta,
            total,
            principal: row_principal,
            remaining: row_principal - total,
            count,
        });
    }

    Ok((entries, current_layout))
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
