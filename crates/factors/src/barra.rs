//! Barra-style market descriptors.
//!
//! Every descriptor here works on trailing windows of daily returns (or
//! turnover) ending at the anchor's trading day, except [`size`], which is a
//! pure cross-section.

use ndarray::{Array2, ArrayView2};
use tessera_calendar::TradingCalendar;
use tessera_math::{FitOptions, exp_weights, fit, fit_simple, nan_std, nan_sum, standardize, winsorize_mad};
use tessera_primitives::{Date, EntityId, FactorTable, Panel};
use tracing::warn;

use crate::{
    FactorError,
    table::{build_table, has_missing, per_row},
};

/// Floor reported by [`liquidity`] in place of a non-finite logarithm.
pub const LIQUIDITY_FLOOR: f64 = -1e10;

/// Configuration for [`regress_barra`].
#[derive(Debug, Clone)]
pub struct RegressConfig {
    /// Number of overlapping windows.
    pub shift: usize,
    /// Window length in trading days.
    pub window: usize,
    /// Half-life of the observation weights.
    pub half_life: usize,
    /// Fit an intercept.
    pub intercept: bool,
    /// Benchmark the returns are regressed on.
    pub benchmark: EntityId,
}

impl Default for RegressConfig {
    fn default() -> Self {
        Self {
            shift: 4,
            window: 504,
            half_life: 252,
            intercept: true,
            benchmark: EntityId::from("000300.SH"),
        }
    }
}

/// Trading days `[idx - len + 1, idx]` for the anchor, failing rather than
/// clamping when the calendar is too short.
fn full_window<'a>(
    calendar: &'a TradingCalendar,
    anchor: Date,
    len: usize,
) -> Result<&'a [Date], FactorError> {
    let dates = calendar.trailing(anchor, len)?;
    if dates.len() < len {
        return Err(FactorError::InsufficientHistory { needed: len, got: dates.len() });
    }
    Ok(dates)
}

fn benchmark_row(returns: &Panel, benchmark: &EntityId, dates: &[Date]) -> Result<Vec<f64>, FactorError> {
    Ok(returns.select(std::slice::from_ref(benchmark), dates)?.values().iter().copied().collect())
}

/// `BETA_barra`, `HALPHA_barra` and `HSIGMA_barra`.
///
/// The anchor's trailing `window + shift` trading days yield `shift`
/// overlapping windows of `window` days, the `i`-th starting `i` days in
/// (`i = 1..=shift`). In each, every entity with a complete return history is
/// regressed on the benchmark with exponentially decaying weights. Beta and
/// alpha are the sums of the per-window slopes and intercepts, missing if
/// any window is missing. Sigma is the residual standard deviation of the
/// last window. A degenerate window is logged and left missing.
///
/// # Errors
/// Returns `InsufficientHistory` when the calendar is too short, and a lookup
/// error if the benchmark or a window date is absent from `returns`.
pub fn regress_barra(
    calendar: &TradingCalendar,
    anchor: Date,
    entities: &[EntityId],
    returns: &Panel,
    config: &RegressConfig,
) -> Result<FactorTable, FactorError> {
    let span = full_window(calendar, anchor, config.window + config.shift)?;
    let weights = exp_weights(config.window, config.half_life);
    let n = entities.len();
    let mut beta = vec![0.0; n];
    let mut alpha = vec![0.0; n];
    let mut sigma = vec![f64::NAN; n];

    for i in 1..=config.shift {
        let dates = &span[i..i + config.window];
        let x = benchmark_row(returns, &config.benchmark, dates)?;
        let y = returns.align(entities, dates)?;
        let valid: Vec<usize> =
            (0..n).filter(|&e| !has_missing(&y.values().row(e).to_vec())).collect();
        let mut shift_alpha = vec![f64::NAN; n];
        let mut shift_beta = vec![f64::NAN; n];

        if !valid.is_empty() {
            let ys = Array2::from_shape_fn((dates.len(), valid.len()), |(t, k)| y.values()[[valid[k], t]]);
            let xs = ArrayView2::from_shape((x.len(), 1), &x)
                .map_err(|_| FactorError::InvalidConfig("benchmark shape".to_string()))?;
            let options = FitOptions::weighted(weights.clone()).with_intercept(config.intercept);
            match fit(xs, ys.view(), &options) {
                Ok(result) => {
                    for (k, &e) in valid.iter().enumerate() {
                        shift_alpha[e] = result.intercept[k];
                        shift_beta[e] = result.slopes[[0, k]];
                        if i == config.shift {
                            sigma[e] = nan_std(&result.residuals.column(k).to_vec());
                        }
                    }
                }
                Err(e) if e.is_recoverable() => warn!(%anchor, shift = i, error = %e, "barra regression failed"),
                Err(e) => return Err(e.into()),
            }
        }
        for e in 0..n {
            alpha[e] += shift_alpha[e];
            beta[e] += shift_beta[e];
        }
    }
    build_table(
        entities,
        vec![
            ("BETA_barra".to_string(), beta),
            ("HALPHA_barra".to_string(), alpha),
            ("HSIGMA_barra".to_string(), sigma),
        ],
    )
}

/// Configuration for [`dastd`].
#[derive(Debug, Clone, Copy)]
pub struct DastdConfig {
    /// Window length in trading days.
    pub window: usize,
    /// Half-life of the weights.
    pub half_life: usize,
}

impl Default for DastdConfig {
    fn default() -> Self {
        Self { window: 252, half_life: 42 }
    }
}

/// `DASTD_barra`: `sqrt(sum(w (r - mean r)^2))` with unnormalized exponential
/// weights and an unweighted mean. Entities with a gap in the window are
/// missing.
///
/// # Errors
/// Returns `InsufficientHistory` when the calendar is too short, and a lookup
/// error if `returns` lacks a window date.
pub fn dastd(
    calendar: &TradingCalendar,
    anchor: Date,
    entities: &[EntityId],
    returns: &Panel,
    config: DastdConfig,
) -> Result<FactorTable, FactorError> {
    let dates = full_window(calendar, anchor, config.window)?;
    let weights = exp_weights(config.window, config.half_life);
    let window = returns.align(entities, dates)?;
    let values = per_row(&window, |row| {
        if has_missing(row) {
            return f64::NAN;
        }
        let mean = row.iter().sum::<f64>() / row.len() as f64;
        row.iter().zip(&weights).map(|(r, w)| w * (r - mean).powi(2)).sum::<f64>().sqrt()
    });
    build_table(entities, vec![("DASTD_barra".to_string(), values)])
}

/// Configuration for [`cmra`].
#[derive(Debug, Clone, Copy)]
pub struct CmraConfig {
    /// Number of months.
    pub months: usize,
    /// Trading days per month.
    pub days_per_month: usize,
}

impl Default for CmraConfig {
    fn default() -> Self {
        Self { months: 12, days_per_month: 21 }
    }
}

/// `CMRA_barra`: range of the cumulative log returns over the last
/// `i * days_per_month` days, `i = 1..=months`. Entities with a gap in the
/// window are missing.
///
/// # Errors
/// Returns `InsufficientHistory` when the calendar is too short, and a lookup
/// error if `returns` lacks a window date.
pub fn cmra(
    calendar: &TradingCalendar,
    anchor: Date,
    entities: &[EntityId],
    returns: &Panel,
    config: CmraConfig,
) -> Result<FactorTable, FactorError> {
    let len = config.months * config.days_per_month;
    let dates = full_window(calendar, anchor, len)?;
    let window = returns.align(entities, dates)?;
    let values = per_row(&window, |row| {
        if has_missing(row) {
            return f64::NAN;
        }
        let logs: Vec<f64> = row.iter().map(|r| r.ln_1p()).collect();
        let sums = (1..=config.months)
            .map(|i| logs[logs.len() - i * config.days_per_month..].iter().sum::<f64>());
        let (lo, hi) = sums.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), z| (lo.min(z), hi.max(z)));
        hi - lo
    });
    build_table(entities, vec![("CMRA_barra".to_string(), values)])
}

/// Configuration for [`liquidity`].
#[derive(Debug, Clone)]
pub struct LiquidityConfig {
    /// Trading days per month.
    pub days_per_month: usize,
    /// Window lengths in months for `STOM`, `STOQ` and `STOA`.
    pub months: [usize; 3],
}

impl Default for LiquidityConfig {
    fn default() -> Self {
        Self { days_per_month: 21, months: [1, 3, 12] }
    }
}

/// `STOM_barra`, `STOQ_barra` and `STOA_barra`.
///
/// Share turnover is `amount / float market cap`. For each window of `m`
/// months the descriptor is `ln(nansum(share turnover) / m)`; a non-finite
/// result is reported as [`LIQUIDITY_FLOOR`]. Windows clamp at the start of
/// the calendar.
///
/// # Errors
/// Returns a calendar error if `anchor` precedes the calendar and a lookup
/// error if a panel lacks a window date.
pub fn liquidity(
    calendar: &TradingCalendar,
    anchor: Date,
    entities: &[EntityId],
    amount: &Panel,
    float_cap: &Panel,
    config: &LiquidityConfig,
) -> Result<FactorTable, FactorError> {
    let longest = config.months.iter().copied().max().unwrap_or(0) * config.days_per_month;
    let dates = calendar.trailing(anchor, longest)?;
    let share = amount.align(entities, dates)?.ratio(&float_cap.align(entities, dates)?)?;

    let names = ["STOM_barra", "STOQ_barra", "STOA_barra"];
    let columns = names
        .iter()
        .zip(config.months)
        .map(|(name, months)| {
            let values = per_row(&share, |row| {
                let start = row.len().saturating_sub(months * config.days_per_month);
                liquidity_log(&row[start..], months)
            });
            ((*name).to_string(), values)
        })
        .collect();
    build_table(entities, columns)
}

fn liquidity_log(share_turnover: &[f64], months: usize) -> f64 {
    let value = (nan_sum(share_turnover) / months as f64).ln();
    if value.is_finite() { value } else { LIQUIDITY_FLOOR }
}

/// Configuration for [`rstr`].
#[derive(Debug, Clone)]
pub struct RstrConfig {
    /// Window length in trading days.
    pub window: usize,
    /// Half-life of the weights.
    pub half_life: usize,
    /// Number of overlapping windows averaged.
    pub shift: usize,
    /// Benchmark for excess returns.
    pub benchmark: EntityId,
}

impl Default for RstrConfig {
    fn default() -> Self {
        Self { window: 252, half_life: 126, shift: 11, benchmark: EntityId::from("000300.SH") }
    }
}

/// `RSTR_barra`: mean over `shift` overlapping windows of the weighted sum of
/// log excess returns over the benchmark, skipping missing days.
///
/// # Errors
/// Returns `InsufficientHistory` when the calendar is too short, and a lookup
/// error if the benchmark or a window date is absent from `returns`.
pub fn rstr(
    calendar: &TradingCalendar,
    anchor: Date,
    entities: &[EntityId],
    returns: &Panel,
    config: &RstrConfig,
) -> Result<FactorTable, FactorError> {
    let span = full_window(calendar, anchor, config.window + config.shift)?;
    let weights = exp_weights(config.window, config.half_life);
    let mut total = vec![0.0; entities.len()];

    for i in 1..=config.shift {
        let dates = &span[i..i + config.window];
        let bench = benchmark_row(returns, &config.benchmark, dates)?;
        let window = returns.align(entities, dates)?;
        let strength = per_row(&window, |row| {
            let excess: Vec<f64> = row
                .iter()
                .zip(&bench)
                .zip(&weights)
                .map(|((r, b), w)| w * (r.ln_1p() - b.ln_1p()))
                .collect();
            nan_sum(&excess)
        });
        for (t, s) in total.iter_mut().zip(strength) {
            *t += s;
        }
    }
    let values = total.into_iter().map(|t| t / config.shift as f64).collect();
    build_table(entities, vec![("RSTR_barra".to_string(), values)])
}

/// Configuration for [`size`].
#[derive(Debug, Clone, Copy)]
pub struct SizeConfig {
    /// MAD multiple for winsorizing the mid-cap residual.
    pub winsor_n: f64,
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self { winsor_n: 5.0 }
    }
}

/// `LNCAP_barra` and `MIDCAP_barra` from float market caps.
///
/// `MIDCAP` is the residual of a weighted regression of `LNCAP^3` on `LNCAP`
/// (weights `sqrt(LNCAP)`), winsorized and standardized. The fit uses the
/// entities where all three are finite; residuals are reported for every
/// entity with a cap. A degenerate fit leaves `MIDCAP` missing.
///
/// # Errors
/// Returns `LengthMismatch` if `float_cap` is not aligned with `entities`.
pub fn size(entities: &[EntityId], float_cap: &[f64], config: SizeConfig) -> Result<FactorTable, FactorError> {
    let lncap: Vec<f64> = float_cap.iter().map(|c| c.ln()).collect();
    let cubed: Vec<f64> = lncap.iter().map(|l| l.powi(3)).collect();

    let (mut x, mut y, mut w) = (Vec::new(), Vec::new(), Vec::new());
    for (l, c) in lncap.iter().zip(&cubed) {
        let weight = l.sqrt();
        if l.is_finite() && c.is_finite() && weight.is_finite() {
            x.push(*l);
            y.push(*c);
            w.push(weight);
        }
    }

    let midcap = match fit_simple(&x, &y, Some(&w)) {
        Ok(line) => {
            let resid: Vec<f64> =
                lncap.iter().zip(&cubed).map(|(l, c)| c - (line.slope * l + line.intercept)).collect();
            standardize(&winsorize_mad(&resid, config.winsor_n))
        }
        Err(e) if e.is_recoverable() => {
            warn!(error = %e, "size regression failed");
            vec![f64::NAN; entities.len()]
        }
        Err(e) => return Err(e.into()),
    };
    build_table(entities, vec![("LNCAP_barra".to_string(), lncap), ("MIDCAP_barra".to_string(), midcap)])
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::Datelike;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn weekday_calendar(n: usize) -> TradingCalendar {
        TradingCalendar::new(
            d(2017, 1, 2)
                .iter_days()
                .filter(|x| x.weekday().num_days_from_monday() < 5)
                .take(n)
                .collect(),
        )
        .unwrap()
    }

    fn returns_panel(calendar: &TradingCalendar, rows: Vec<(&str, Vec<f64>)>) -> Panel {
        Panel::from_rows(
            calendar.days().to_vec(),
            rows.into_iter().map(|(e, v)| (e.into(), v)).collect(),
        )
        .unwrap()
    }

    fn bench_series(n: usize) -> Vec<f64> {
        (0..n).map(|t| ((t * 13) % 17) as f64 / 1000.0 - 0.008).collect()
    }

    #[test]
    fn regress_barra_sums_shift_coefficients() {
        let calendar = weekday_calendar(600);
        let bench = bench_series(600);
        let a: Vec<f64> = bench.iter().map(|b| 0.001 + 0.8 * b).collect();
        let mut b = a.clone();
        b[590] = f64::NAN;
        let returns = returns_panel(&calendar, vec![("000300.SH", bench), ("A", a), ("B", b)]);
        let config = RegressConfig { window: 100, half_life: 50, ..Default::default() };

        let anchor = calendar.last().unwrap();
        let table = regress_barra(&calendar, anchor, &["A".into(), "B".into()], &returns, &config).unwrap();
        assert_relative_eq!(table.column("BETA_barra").unwrap()[0], 3.2, epsilon = 1e-8);
        assert_relative_eq!(table.column("HALPHA_barra").unwrap()[0], 0.004, epsilon = 1e-8);
        assert_relative_eq!(table.column("HSIGMA_barra").unwrap()[0], 0.0, epsilon = 1e-8);
        assert!(table.column("BETA_barra").unwrap()[1].is_nan());
        assert!(table.column("HSIGMA_barra").unwrap()[1].is_nan());
    }

    #[test]
    fn regress_barra_needs_history() {
        let calendar = weekday_calendar(300);
        let returns = returns_panel(&calendar, vec![("000300.SH", vec![0.0; 300])]);
        let err = regress_barra(
            &calendar,
            calendar.last().unwrap(),
            &["000300.SH".into()],
            &returns,
            &RegressConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FactorError::InsufficientHistory { needed: 508, got: 300 }));
    }

    #[test]
    fn dastd_constant_returns_is_zero() {
        let calendar = weekday_calendar(300);
        let returns = returns_panel(&calendar, vec![("A", vec![0.01; 300])]);
        let table =
            dastd(&calendar, calendar.last().unwrap(), &["A".into()], &returns, DastdConfig::default()).unwrap();
        assert_relative_eq!(table.column("DASTD_barra").unwrap()[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn dastd_matches_weighted_formula() {
        let calendar = weekday_calendar(10);
        let r: Vec<f64> = (0..10).map(|t| if t % 2 == 0 { 0.01 } else { -0.01 }).collect();
        let returns = returns_panel(&calendar, vec![("A", r.clone())]);
        let config = DastdConfig { window: 4, half_life: 2 };
        let table = dastd(&calendar, calendar.last().unwrap(), &["A".into()], &returns, config).unwrap();
        let w = exp_weights(4, 2);
        let expected = (0..4).map(|t| w[t] * 0.01_f64.powi(2)).sum::<f64>().sqrt();
        assert_relative_eq!(table.column("DASTD_barra").unwrap()[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn cmra_range_of_cumulative_log_returns() {
        let calendar = weekday_calendar(6);
        // Months of two days: cumulative sums over the last 2, 4, 6 days.
        let r = vec![0.1, 0.1, -0.2, -0.2, 0.05, 0.05];
        let returns = returns_panel(&calendar, vec![("A", r.clone())]);
        let config = CmraConfig { months: 3, days_per_month: 2 };
        let table = cmra(&calendar, calendar.last().unwrap(), &["A".into()], &returns, config).unwrap();

        let logs: Vec<f64> = r.iter().map(|x: &f64| x.ln_1p()).collect();
        let z1: f64 = logs[4..].iter().sum();
        let z2: f64 = logs[2..].iter().sum();
        let z3: f64 = logs.iter().sum();
        let expected = z1.max(z2).max(z3) - z1.min(z2).min(z3);
        assert_relative_eq!(table.column("CMRA_barra").unwrap()[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn zero_turnover_hits_the_floor() {
        let calendar = weekday_calendar(300);
        let amount = returns_panel(&calendar, vec![("A", vec![0.0; 300]), ("B", vec![2.0; 300])]);
        let cap = returns_panel(&calendar, vec![("A", vec![100.0; 300]), ("B", vec![100.0; 300])]);
        let table = liquidity(
            &calendar,
            calendar.last().unwrap(),
            &["A".into(), "B".into()],
            &amount,
            &cap,
            &LiquidityConfig::default(),
        )
        .unwrap();
        assert_eq!(table.column("STOM_barra").unwrap()[0], LIQUIDITY_FLOOR);
        assert_eq!(table.column("STOA_barra").unwrap()[0], LIQUIDITY_FLOOR);
        assert_relative_eq!(table.column("STOM_barra").unwrap()[1], (21.0_f64 * 0.02).ln(), epsilon = 1e-12);
        assert_relative_eq!(table.column("STOQ_barra").unwrap()[1], (63.0_f64 * 0.02 / 3.0).ln(), epsilon = 1e-12);
    }

    #[test]
    fn rstr_zero_when_tracking_benchmark() {
        let calendar = weekday_calendar(300);
        let bench = bench_series(300);
        let returns = returns_panel(&calendar, vec![("000300.SH", bench.clone()), ("A", bench)]);
        let table =
            rstr(&calendar, calendar.last().unwrap(), &["A".into()], &returns, &RstrConfig::default()).unwrap();
        assert_relative_eq!(table.column("RSTR_barra").unwrap()[0], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rstr_constant_excess() {
        let calendar = weekday_calendar(30);
        let returns = returns_panel(&calendar, vec![("000300.SH", vec![0.0; 30]), ("A", vec![0.01; 30])]);
        let config = RstrConfig { window: 10, half_life: 5, shift: 3, ..Default::default() };
        let table = rstr(&calendar, calendar.last().unwrap(), &["A".into()], &returns, &config).unwrap();
        let expected = exp_weights(10, 5).sum() * 0.01_f64.ln_1p();
        assert_relative_eq!(table.column("RSTR_barra").unwrap()[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn size_descriptors() {
        let entities: Vec<EntityId> = (0..6).map(|i| EntityId::new(format!("S{i}"))).collect();
        let caps = [1e8, 5e8, 1e9, 5e9, 1e10, f64::NAN];
        let table = size(&entities, &caps, SizeConfig::default()).unwrap();

        assert_relative_eq!(table.column("LNCAP_barra").unwrap()[2], 1e9_f64.ln());
        let midcap = table.column("MIDCAP_barra").unwrap();
        assert!(midcap[5].is_nan());
        let valid: Vec<f64> = midcap[..5].to_vec();
        assert_relative_eq!(valid.iter().sum::<f64>() / 5.0, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn size_with_too_few_caps_is_missing() {
        let table = size(&["A".into()], &[1e9], SizeConfig::default()).unwrap();
        assert!(table.column("MIDCAP_barra").unwrap()[0].is_nan());
        assert!(!table.column("LNCAP_barra").unwrap()[0].is_nan());
    }
}
