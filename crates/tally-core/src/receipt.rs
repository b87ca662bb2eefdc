//! Receipt text parsing
//!
//! Turns raw OCR output into an [`ExpenseRecord`]. Pure functions only: the OCR
//! engine that produced the text lives behind [`crate::ocr::OcrEngine`].
//!
//! Total selection: the last line mentioning "total" wins (subtotal, savings,
//! discount and item-count lines never count), and on that line the last
//! positive monetary token is taken. Clock times such as `14:22` are not
//! amounts.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::ParseError;
use crate::models::{ExpenseRecord, ReceiptItem};

static MONEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?$").expect("valid regex")
});

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("valid regex"));

static NUMERIC_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4}|\d{2})\b").expect("valid regex")
});

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,2}:\d{2}(?::\d{2})?(?i:[ap]m)?$").expect("valid regex")
});

static ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([A-Za-z][A-Za-z0-9&'.\-/ ]*?)\s+(?:(\d+)\s*[xX@]?\s+)?(?:[$₹€£]\s*)?(\d+(?:\.\d{1,2})?)$",
    )
    .expect("valid regex")
});

/// Phrases containing "total" that never carry the amount charged
const NON_TOTAL_PHRASES: &[&str] = &[
    "subtotal",
    "sub total",
    "sub-total",
    "total savings",
    "total discount",
    "total items",
    "total qty",
    "total quantity",
];

/// Lines with any of these whole words are bookkeeping, not purchased items
const NON_ITEM_WORDS: &[&str] = &[
    "total", "subtotal", "tax", "change", "cash", "card", "balance", "tender", "visa", "due",
    "discount", "savings", "phone",
];

/// Parse OCR text into an expense record
///
/// Fails with [`ParseError::EmptyText`] for blank input and
/// [`ParseError::NoTotalFound`] when no total line carries an amount above
/// zero.
pub fn parse_receipt(text: &str) -> Result<ExpenseRecord, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyText);
    }

    let amount = extract_total(text).ok_or(ParseError::NoTotalFound)?;

    Ok(ExpenseRecord {
        date: extract_date(text),
        amount,
        items: extract_items(text),
    })
}

/// Find the charged total, if any
///
/// Zero amounts are skipped like negative ones: nothing was spent.
pub fn extract_total(text: &str) -> Option<Decimal> {
    text.lines()
        .filter(|line| is_total_line(line))
        .filter_map(|line| money_tokens(line).filter(|a| *a > Decimal::ZERO).last())
        .last()
}

fn is_total_line(line: &str) -> bool {
    let mut lower = line.to_lowercase();
    for phrase in NON_TOTAL_PHRASES {
        lower = lower.replace(phrase, " ");
    }
    lower.contains("total")
}

/// All non-negative monetary amounts on a line, left to right
///
/// A `label:amount` token yields the part after the colon; clock times yield
/// nothing.
fn money_tokens(line: &str) -> impl Iterator<Item = Decimal> + '_ {
    line.split(|c: char| c.is_whitespace() || c == '=')
        .filter(|token| !TIME_RE.is_match(token))
        .filter_map(|token| token.rsplit(':').next())
        .filter_map(parse_money)
}

fn parse_money(token: &str) -> Option<Decimal> {
    let token = token.trim_matches(|c: char| matches!(c, '(' | ')' | ',' | ';' | '*' | '.'));
    if token.starts_with('-') {
        return None;
    }

    let lower = token.to_lowercase();
    let digits = ["$", "₹", "€", "£", "rs.", "rs", "inr"]
        .iter()
        .find_map(|prefix| lower.strip_prefix(prefix))
        .unwrap_or(&lower);

    if !MONEY_RE.is_match(digits) {
        return None;
    }
    Decimal::from_str(&digits.replace(',', "")).ok()
}

/// First recognizable date in the text
///
/// `YYYY-MM-DD` is unambiguous. Slash or dash dates are read month-first, and
/// day-first only when month-first is not a real date. Two-digit years are 20YY.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    let iso = ISO_DATE_RE.captures_iter(text).filter_map(|caps| {
        let start = caps.get(0)?.start();
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )?;
        Some((start, date))
    });

    let numeric = NUMERIC_DATE_RE.captures_iter(text).filter_map(|caps| {
        let start = caps.get(0)?.start();
        let first: u32 = caps[1].parse().ok()?;
        let second: u32 = caps[2].parse().ok()?;
        let mut year: i32 = caps[3].parse().ok()?;
        if caps[3].len() == 2 {
            year += 2000;
        }
        let date = NaiveDate::from_ymd_opt(year, first, second)
            .or_else(|| NaiveDate::from_ymd_opt(year, second, first))?;
        Some((start, date))
    });

    iso.chain(numeric)
        .min_by_key(|(start, _)| *start)
        .map(|(_, date)| date)
}

/// Line items of the form `label [qty] [x] price`
pub fn extract_items(text: &str) -> Vec<ReceiptItem> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_bookkeeping_line(line))
        .filter_map(|line| {
            let caps = ITEM_RE.captures(line)?;
            let name = caps[1].trim().to_string();
            let price = Decimal::from_str(&caps[3]).ok()?;
            Some(ReceiptItem { name, price })
        })
        .collect()
}

fn is_bookkeeping_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower
        .split(|c: char| !c.is_alphabetic())
        .any(|word| NON_ITEM_WORDS.contains(&word))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_simple_total() {
        let record = parse_receipt("Total: $42.50").unwrap();
        assert_eq!(record.amount, dec("42.50"));
        assert_eq!(record.date, None);
    }

    #[test]
    fn test_subtotal_is_not_total() {
        let text = "Subtotal 40.00\nTax 2.50\nTotal 42.50";
        assert_eq!(parse_receipt(text).unwrap().amount, dec("42.50"));
    }

    #[test]
    fn test_only_subtotal_fails() {
        assert_eq!(
            parse_receipt("Coffee 3.00\nSubtotal 3.00"),
            Err(ParseError::NoTotalFound)
        );
    }

    #[test]
    fn test_last_total_line_wins() {
        let text = "TOTAL 10.00\nTOTAL SAVINGS 2.00\nCoupon applied\nTOTAL DUE 12.00";
        assert_eq!(parse_receipt(text).unwrap().amount, dec("12.00"));
    }

    #[test]
    fn test_last_amount_on_total_line() {
        let text = "Total (2 items) 18.40";
        assert_eq!(parse_receipt(text).unwrap().amount, dec("18.40"));
    }

    #[test]
    fn test_total_line_without_amount_is_skipped() {
        let text = "Total 9.99\nThank you! Total satisfaction guaranteed";
        assert_eq!(parse_receipt(text).unwrap().amount, dec("9.99"));
    }

    #[test]
    fn test_thousands_and_currency_prefix() {
        assert_eq!(extract_total("Grand Total ₹1,234.50"), Some(dec("1234.50")));
        assert_eq!(extract_total("TOTAL Rs.250"), Some(dec("250")));
    }

    #[test]
    fn test_negative_amount_is_not_total() {
        assert_eq!(extract_total("Total -5.00"), None);
    }

    #[test]
    fn test_zero_total_is_no_total() {
        assert_eq!(extract_total("Total 0.00"), None);
        assert_eq!(
            parse_receipt("SHOP\nFree sample 0.00\nTOTAL 0.00"),
            Err(ParseError::NoTotalFound)
        );
        // An earlier real total still counts
        assert_eq!(
            extract_total("TOTAL 12.00\nTOTAL SAVED 0"),
            Some(dec("12.00"))
        );
    }

    #[test]
    fn test_clock_time_on_total_line() {
        assert_eq!(extract_total("TOTAL $17.01 14:22"), Some(dec("17.01")));
        assert_eq!(extract_total("Total 8.40 09:05:11 PM"), Some(dec("8.40")));
        assert_eq!(extract_total("Total:$42.50"), Some(dec("42.50")));
        assert_eq!(extract_total("TOTAL 10:45"), None);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(parse_receipt("   \n\t"), Err(ParseError::EmptyText));
    }

    #[test]
    fn test_no_total() {
        assert_eq!(
            parse_receipt("Milk 2 3.50\nBread 2.25"),
            Err(ParseError::NoTotalFound)
        );
    }

    #[test]
    fn test_date_month_first() {
        assert_eq!(
            extract_date("Date: 01/15/2024 10:32"),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[test]
    fn test_date_day_first_fallback() {
        assert_eq!(
            extract_date("15/01/2024"),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[test]
    fn test_date_iso_and_short_year() {
        assert_eq!(extract_date("2024-03-05"), NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(extract_date("3-4-24"), NaiveDate::from_ymd_opt(2024, 3, 4));
    }

    #[test]
    fn test_first_date_wins() {
        let text = "Printed 02/01/2024\nVisit by 2024-12-31";
        assert_eq!(extract_date(text), NaiveDate::from_ymd_opt(2024, 2, 1));
    }

    #[test]
    fn test_invalid_date_ignored() {
        assert_eq!(extract_date("Ref 45/67/2024"), None);
    }

    #[test]
    fn test_items() {
        let text = "FRESH MART\nMilk 2 3.50\nBread 2.25\nEggs 2 x 4.99\nSubtotal 10.74\nTax 0.50\nTotal 11.24";
        let items = extract_items(text);
        assert_eq!(
            items,
            vec![
                ReceiptItem {
                    name: "Milk".into(),
                    price: dec("3.50")
                },
                ReceiptItem {
                    name: "Bread".into(),
                    price: dec("2.25")
                },
                ReceiptItem {
                    name: "Eggs".into(),
                    price: dec("4.99")
                },
            ]
        );
    }

    #[test]
    fn test_item_names_containing_keywords() {
        let text = "Cashews 5.99\nCardamom 2.10\nFondue Set 19.99\nTaxi Toy 4.00\nMilk 3.50\nCard 1.00\nTotal 36.58";
        let names: Vec<String> = extract_items(text).into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["Cashews", "Cardamom", "Fondue Set", "Taxi Toy", "Milk"]);
    }

    #[test]
    fn test_full_receipt() {
        let text = "CORNER GROCERY\n03/14/2024\nApples 1 4.20\nRice 12.00\nSUBTOTAL 16.20\nTAX 0.81\nTOTAL $17.01\nCASH 20.00\nCHANGE 2.99";
        let record = parse_receipt(text).unwrap();
        assert_eq!(record.amount, dec("17.01"));
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 3, 14));
        assert_eq!(record.items.len(), 2);
        assert_eq!(record.items[1].name, "Rice");
    }
}
