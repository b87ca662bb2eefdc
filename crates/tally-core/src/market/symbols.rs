//! Ticker symbol normalization and symbol-file loading

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::config::Exchange;
use crate::error::{Error, Result};

const EXCHANGE_SUFFIXES: [&str; 2] = [".NS", ".BO"];

/// Uppercase, trim, and strip any exchange suffix
pub fn base_symbol(raw: &str) -> String {
    let mut symbol = raw.trim().to_uppercase();
    for suffix in EXCHANGE_SUFFIXES {
        if let Some(stripped) = symbol.strip_suffix(suffix) {
            symbol = stripped.to_string();
        }
    }
    symbol
}

/// Alphanumeric, 1 to 20 characters, once the exchange suffix is removed
pub fn is_valid_symbol(raw: &str) -> bool {
    let symbol = base_symbol(raw);
    (1..=20).contains(&symbol.len()) && symbol.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Validate and rewrite a symbol into the provider's form (`RELIANCE` -> `RELIANCE.NS`)
pub fn normalize_symbol(raw: &str, exchange: Exchange) -> Result<String> {
    if !is_valid_symbol(raw) {
        return Err(Error::InvalidData(format!("Invalid symbol: {:?}", raw.trim())));
    }
    Ok(format!("{}{}", base_symbol(raw), exchange.suffix()))
}

/// Normalize a batch, dropping invalid symbols and duplicates (first one wins)
///
/// Returns the accepted symbols in input order and the rejected raw inputs.
pub fn normalize_all<S: AsRef<str>>(raw: &[S], exchange: Exchange) -> (Vec<String>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for item in raw {
        let item = item.as_ref();
        if item.trim().is_empty() {
            continue;
        }
        match normalize_symbol(item, exchange) {
            Ok(symbol) => {
                if seen.insert(symbol.clone()) {
                    accepted.push(symbol);
                }
            }
            Err(_) => rejected.push(item.trim().to_string()),
        }
    }

    (accepted, rejected)
}

/// Read symbols from a file
///
/// `.csv` files are read with headers and the `column` field is taken
/// (case-insensitive header match). Anything else is one symbol per line,
/// with blank lines and `#` comments skipped.
pub fn load_symbols(path: &Path, column: &str) -> Result<Vec<String>> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader.headers()?.clone();
        let index = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(column))
            .ok_or_else(|| {
                Error::InvalidData(format!(
                    "{} has no '{}' column",
                    path.display(),
                    column
                ))
            })?;

        let mut symbols = Vec::new();
        for record in reader.records() {
            let record = record?;
            if let Some(value) = record.get(index) {
                let value = value.trim();
                if !value.is_empty() {
                    symbols.push(value.to_string());
                }
            }
        }
        Ok(symbols)
    } else {
        let content = fs::read_to_string(path)?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_normalize_adds_exchange_suffix() {
        assert_eq!(normalize_symbol(" reliance ", Exchange::Nse).unwrap(), "RELIANCE.NS");
        assert_eq!(normalize_symbol("TCS.NS", Exchange::Bse).unwrap(), "TCS.BO");
        assert_eq!(normalize_symbol("aapl", Exchange::Plain).unwrap(), "AAPL");
    }

    #[test]
    fn test_invalid_symbols_rejected() {
        assert!(!is_valid_symbol(""));
        assert!(!is_valid_symbol(".NS"));
        assert!(!is_valid_symbol("BRK-B"));
        assert!(!is_valid_symbol("ABCDEFGHIJKLMNOPQRSTU"));
        assert!(is_valid_symbol("ABCDEFGHIJKLMNOPQRST"));
    }

    #[test]
    fn test_normalize_all_dedupes_and_reports_rejects() {
        let (ok, bad) = normalize_all(&["infy", "INFY.NS", "bad symbol", "", "wipro"], Exchange::Nse);
        assert_eq!(ok, vec!["INFY.NS", "WIPRO.NS"]);
        assert_eq!(bad, vec!["bad symbol"]);
    }

    #[test]
    fn test_load_symbols_csv_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watch.csv");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "Name,Symbol").unwrap();
        writeln!(file, "Infosys,INFY").unwrap();
        writeln!(file, "Blank,").unwrap();
        writeln!(file, "Wipro,WIPRO").unwrap();

        assert_eq!(load_symbols(&path, "symbol").unwrap(), vec!["INFY", "WIPRO"]);
        assert!(load_symbols(&path, "ticker").is_err());
    }

    #[test]
    fn test_load_symbols_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watch.txt");
        fs::write(&path, "# watchlist\nINFY\n\n  tcs  \n").unwrap();

        assert_eq!(load_symbols(&path, "symbol").unwrap(), vec!["INFY", "tcs"]);
    }
}
