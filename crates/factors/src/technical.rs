//! Technical indicators on the adjusted close.
//!
//! Each indicator reads a trailing window of the close panel's own dates
//! ending at the anchor and reports only the value at the anchor.

use tessera_calendar::resolve_date_index;
use tessera_math::{ewm_mean, safe_div};
use tessera_primitives::{Date, EntityId, FactorTable, Panel};

use crate::{
    FactorError,
    table::{build_table, per_row},
};

/// Indicator parameters.
#[derive(Debug, Clone, Copy)]
pub struct TechnicalConfig {
    /// Fast span, slow span and signal span of MACD.
    pub macd: (usize, usize, usize),
    /// Extra warm-up days for the MACD exponential averages.
    pub macd_buffer: usize,
    /// PSY window.
    pub psy: usize,
    /// RSI window.
    pub rsi: usize,
    /// BIAS window.
    pub bias: usize,
}

impl Default for TechnicalConfig {
    fn default() -> Self {
        Self { macd: (10, 30, 15), macd_buffer: 240, psy: 20, rsi: 20, bias: 20 }
    }
}

/// `DIF`, `DEA`, `MACD`, `RSI`, `PSY` and `BIAS` at `anchor`.
///
/// # Errors
/// Returns a calendar error if `anchor` precedes the close panel.
pub fn technical(
    anchor: Date,
    entities: &[EntityId],
    close: &Panel,
    config: TechnicalConfig,
) -> Result<FactorTable, FactorError> {
    let idx = resolve_date_index(anchor, close.dates())?;
    let window = |len: usize| -> Result<Panel, FactorError> {
        let start = (idx + 1).saturating_sub(len);
        Ok(close.align(entities, &close.dates()[start..=idx])?)
    };

    let (n1, n2, m) = config.macd;
    let macd_window = window(n1.max(n2).max(m) + config.macd_buffer)?;
    let lines: Vec<(f64, f64, f64)> = macd_window
        .values()
        .rows()
        .into_iter()
        .map(|row| macd(&row.to_vec(), n1, n2, m))
        .collect();

    let columns = vec![
        ("DIF".to_string(), lines.iter().map(|l| l.0).collect()),
        ("DEA".to_string(), lines.iter().map(|l| l.1).collect()),
        ("MACD".to_string(), lines.iter().map(|l| l.2).collect()),
        ("RSI".to_string(), per_row(&window(config.rsi + 1)?, |row| rsi(row, config.rsi))),
        ("PSY".to_string(), per_row(&window(config.psy + 1)?, |row| psy(row, config.psy))),
        ("BIAS".to_string(), per_row(&window(config.bias)?, |row| bias(row, config.bias))),
    ];
    build_table(entities, columns)
}

/// Exponential moving average with span `n`.
fn ema(values: &[f64], n: usize) -> Vec<f64> {
    ewm_mean(values, 2.0 / (n as f64 + 1.0))
}

/// Smoothed moving average with weight `m / n` on the latest value.
fn sma(values: &[f64], n: usize, m: usize) -> Vec<f64> {
    ewm_mean(values, m as f64 / n as f64)
}

fn last(values: &[f64]) -> f64 {
    values.last().copied().unwrap_or(f64::NAN)
}

/// `(DIF, DEA, MACD)` at the last close.
fn macd(close: &[f64], n1: usize, n2: usize, m: usize) -> (f64, f64, f64) {
    let dif: Vec<f64> = ema(close, n1).iter().zip(ema(close, n2)).map(|(a, b)| a - b).collect();
    let dea = ema(&dif, m);
    let (dif, dea) = (last(&dif), last(&dea));
    (dif, dea, 2.0 * (dif - dea))
}

/// Share of up days among the last `m` closes, in percent.
fn psy(close: &[f64], m: usize) -> f64 {
    if close.len() < m || m == 0 || close.iter().all(|v| v.is_nan()) {
        return f64::NAN;
    }
    // A comparison involving a missing close counts as not up.
    let up = (close.len() - m..close.len())
        .filter(|&t| t > 0 && close[t] > close[t - 1])
        .count();
    100.0 * up as f64 / m as f64
}

fn rsi(close: &[f64], n: usize) -> f64 {
    let delta: Vec<f64> = (0..close.len())
        .map(|t| if t == 0 { f64::NAN } else { close[t] - close[t - 1] })
        .collect();
    let gain: Vec<f64> = delta.iter().map(|&d| if d > 0.0 { d } else { 0.0 }).collect();
    let range: Vec<f64> = delta.iter().map(|d| d.abs()).collect();
    100.0 * safe_div(last(&sma(&gain, n, 1)), last(&sma(&range, n, 1)))
}

fn bias(close: &[f64], n: usize) -> f64 {
    if close.len() < n || n == 0 {
        return f64::NAN;
    }
    let tail = &close[close.len() - n..];
    if tail.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let ma = tail.iter().sum::<f64>() / n as f64;
    100.0 * safe_div(last(close) - ma, ma)
}
