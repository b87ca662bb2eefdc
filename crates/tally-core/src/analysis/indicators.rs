//! Price indicators over a close series (oldest first)
//!
//! Each function returns `None` when the series is too short for its window.

use serde::{Deserialize, Serialize};

/// Trading days per year, for annualizing daily volatility
pub const TRADING_DAYS: f64 = 252.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bollinger {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// Band width as a percentage of the middle band
    pub width: f64,
}

/// Percentage change from `old` to `new`; `None` when `old` is zero
pub fn pct_change(old: f64, new: f64) -> Option<f64> {
    if old == 0.0 || !old.is_finite() || !new.is_finite() {
        return None;
    }
    Some((new - old) / old.abs() * 100.0)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1)
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Simple moving average of the last `window` values
pub fn sma(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    mean(&values[values.len() - window..])
}

/// Exponential moving average series, seeded with the first value
fn ema_series(values: &[f64], window: usize) -> Vec<f64> {
    let alpha = 2.0 / (window as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev = match values.first() {
        Some(v) => *v,
        None => return out,
    };
    for &v in values {
        prev = alpha * v + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

/// Latest exponential moving average
pub fn ema(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    ema_series(values, window).last().copied()
}

/// Wilder's relative strength index
pub fn rsi(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() <= period {
        return None;
    }

    let changes: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |c: &f64| c.max(0.0);
    let loss = |c: &f64| (-c).max(0.0);

    let mut avg_gain = changes[..period].iter().map(gain).sum::<f64>() / period as f64;
    let mut avg_loss = changes[..period].iter().map(loss).sum::<f64>() / period as f64;
    for c in &changes[period..] {
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain(c)) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss(c)) / period as f64;
    }

    Some(match (avg_gain == 0.0, avg_loss == 0.0) {
        (true, true) => 50.0,
        (_, true) => 100.0,
        _ => 100.0 - 100.0 / (1.0 + avg_gain / avg_loss),
    })
}

pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> Option<Macd> {
    if fast == 0 || signal == 0 || values.len() < slow.max(fast).max(signal) {
        return None;
    }
    let fast_line = ema_series(values, fast);
    let slow_line = ema_series(values, slow);
    let macd_line: Vec<f64> = fast_line
        .iter()
        .zip(&slow_line)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_series(&macd_line, signal);

    let macd = *macd_line.last()?;
    let signal = *signal_line.last()?;
    Some(Macd {
        macd,
        signal,
        histogram: macd - signal,
    })
}

pub fn bollinger(values: &[f64], period: usize, k: f64) -> Option<Bollinger> {
    if period == 0 || values.len() < period {
        return None;
    }
    let window = &values[values.len() - period..];
    let middle = mean(window)?;
    let sd = population_std(window)?;
    let upper = middle + k * sd;
    let lower = middle - k * sd;
    let width = if middle != 0.0 {
        (upper - lower) / middle * 100.0
    } else {
        0.0
    };
    Some(Bollinger {
        upper,
        middle,
        lower,
        width,
    })
}

/// Day-over-day fractional returns
pub fn returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Annualized volatility in percent: std(returns) x sqrt(252) x 100
pub fn annualized_volatility(values: &[f64]) -> Option<f64> {
    std_dev(&returns(values)).map(|sd| sd * TRADING_DAYS.sqrt() * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_sma_uses_trailing_window() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(approx(sma(&values, 3).unwrap(), 4.0));
        assert_eq!(sma(&values, 6), None);
    }

    #[test]
    fn test_ema_of_constant_is_constant() {
        let values = [7.5; 30];
        assert!(approx(ema(&values, 10).unwrap(), 7.5));
    }

    #[test]
    fn test_rsi_extremes() {
        let rising: Vec<f64> = (1..=20).map(f64::from).collect();
        assert!(approx(rsi(&rising, 14).unwrap(), 100.0));

        let falling: Vec<f64> = (1..=20).rev().map(f64::from).collect();
        assert!(approx(rsi(&falling, 14).unwrap(), 0.0));

        assert!(approx(rsi(&[3.0; 20], 14).unwrap(), 50.0));
        assert_eq!(rsi(&[1.0; 14], 14), None);
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let rising: Vec<f64> = (1..=60).map(f64::from).collect();
        let m = macd(&rising, 12, 26, 9).unwrap();
        assert!(m.macd > 0.0);
        assert!(approx(m.histogram, m.macd - m.signal));
    }

    #[test]
    fn test_bollinger_flat_series_has_zero_width() {
        let b = bollinger(&[10.0; 25], 20, 2.0).unwrap();
        assert!(approx(b.upper, 10.0));
        assert!(approx(b.lower, 10.0));
        assert!(approx(b.width, 0.0));
    }

    #[test]
    fn test_pct_change_and_volatility() {
        assert!(approx(pct_change(50.0, 75.0).unwrap(), 50.0));
        assert_eq!(pct_change(0.0, 1.0), None);
        assert!(approx(annualized_volatility(&[10.0; 40]).unwrap(), 0.0));
        assert_eq!(annualized_volatility(&[10.0, 11.0]), None);
    }
}
