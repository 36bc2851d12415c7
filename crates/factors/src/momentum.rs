//! Momentum, volatility and index-regression reducers.

use ndarray::{Array2, ArrayView2};
use tessera_calendar::{BoundaryPolicy, PeriodUnit, TradingCalendar, resolve_date_index};
use tessera_math::{FitOptions, compound, fit, nan_mean, nan_std};
use tessera_primitives::{Date, EntityId, FactorTable, Panel};
use tracing::warn;

use crate::{
    DEFAULT_SENTINEL, FactorError,
    table::{build_table, has_missing},
    turnover::sentinel_guarded,
};

/// Configuration for [`momentum_volatility`].
#[derive(Debug, Clone)]
pub struct MomentumConfig {
    /// Lookbacks in months.
    pub lookbacks: Vec<u32>,
    /// Placement of each window's first day.
    pub policy: BoundaryPolicy,
    /// Values at or above this stop a window.
    pub sentinel: f64,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            lookbacks: vec![1, 3, 6, 12],
            policy: BoundaryPolicy::NextMonthStart,
            sentinel: DEFAULT_SENTINEL,
        }
    }
}

/// Momentum and volatility over each lookback ending at `anchor`.
///
/// For lookback `L` months with `n` trading days in the window:
/// - `return_{L}m`: compounded daily return;
/// - `wgt_return_{L}m`: mean of return times turnover;
/// - `exp_wgt_return_{L}m`: the same, with the `j`-th day further weighted by
///   `exp(-(n - 1 - j) / (4 L))`;
/// - `std_{L}m`: population standard deviation of daily returns.
///
/// The last three are missing when the window holds a sentinel.
///
/// # Errors
/// Returns a calendar error if `anchor` precedes the calendar and a lookup
/// error if a panel lacks a window date.
pub fn momentum_volatility(
    calendar: &TradingCalendar,
    anchor: Date,
    entities: &[EntityId],
    returns: &Panel,
    turnover: &Panel,
    config: &MomentumConfig,
) -> Result<FactorTable, FactorError> {
    let mut columns = Vec::with_capacity(config.lookbacks.len() * 4);
    for &months in &config.lookbacks {
        let dates = calendar.lookback(anchor, -(months as i32), PeriodUnit::Month, config.policy)?;
        let r = returns.align(entities, &dates)?;
        let t = turnover.align(entities, &dates)?;
        let weighted = r.zip_with(&t, |a, b| a * b)?;

        let n = dates.len();
        let decay: Vec<f64> = (0..n)
            .map(|j| (-((n - 1 - j) as f64) / 4.0 / f64::from(months)).exp())
            .collect();

        let mut ret = Vec::with_capacity(entities.len());
        let mut wgt = Vec::with_capacity(entities.len());
        let mut exp_wgt = Vec::with_capacity(entities.len());
        let mut std = Vec::with_capacity(entities.len());
        for (r_row, w_row) in r.values().rows().into_iter().zip(weighted.values().rows()) {
            let r_row = r_row.to_vec();
            let w_row = w_row.to_vec();
            let e_row: Vec<f64> = w_row.iter().zip(&decay).map(|(w, k)| w * k).collect();

            ret.push(if r_row.iter().all(|v| v.is_nan()) { f64::NAN } else { compound(&r_row) });
            wgt.push(sentinel_guarded(&w_row, config.sentinel, nan_mean));
            exp_wgt.push(sentinel_guarded(&e_row, config.sentinel, nan_mean));
            std.push(sentinel_guarded(&r_row, config.sentinel, nan_std));
        }
        columns.push((format!("return_{months}m"), ret));
        columns.push((format!("wgt_return_{months}m"), wgt));
        columns.push((format!("exp_wgt_return_{months}m"), exp_wgt));
        columns.push((format!("std_{months}m"), std));
    }
    build_table(entities, columns)
}

/// Configuration for [`index_regression`].
#[derive(Debug, Clone)]
pub struct IndexRegressionConfig {
    /// Market index regressed against.
    pub index: EntityId,
    /// Number of monthly returns.
    pub months: usize,
}

impl Default for IndexRegressionConfig {
    fn default() -> Self {
        Self { index: EntityId::from("000001.SH"), months: 60 }
    }
}

/// `HAlpha` (intercept) and `beta` (slope) of each entity's monthly returns
/// on the market index over the last `months` months ending at `caldate`.
///
/// Entities with any missing month are reported as missing. A degenerate fit
/// leaves both columns missing.
///
/// # Errors
/// Returns `InsufficientHistory` if fewer than `months` monthly columns end at
/// `caldate`, and a lookup error if the index has no row.
pub fn index_regression(
    caldate: Date,
    entities: &[EntityId],
    monthly_returns: &Panel,
    config: &IndexRegressionConfig,
) -> Result<FactorTable, FactorError> {
    let end = resolve_date_index(caldate, monthly_returns.dates())? + 1;
    if end < config.months {
        return Err(FactorError::InsufficientHistory { needed: config.months, got: end });
    }
    let dates = &monthly_returns.dates()[end - config.months..end];
    let x: Vec<f64> = monthly_returns
        .select(std::slice::from_ref(&config.index), dates)?
        .values()
        .iter()
        .copied()
        .collect();
    let y = monthly_returns.align(entities, dates)?;

    let valid: Vec<usize> =
        (0..entities.len()).filter(|&i| !has_missing(&y.values().row(i).to_vec())).collect();
    let mut alpha = vec![f64::NAN; entities.len()];
    let mut beta = vec![f64::NAN; entities.len()];

    if !valid.is_empty() {
        let ys = Array2::from_shape_fn((dates.len(), valid.len()), |(t, k)| y.values()[[valid[k], t]]);
        let xs = ArrayView2::from_shape((x.len(), 1), &x)
            .map_err(|_| FactorError::InvalidConfig("index series shape".to_string()))?;
        match fit(xs, ys.view(), &FitOptions::ols()) {
            Ok(result) => {
                for (k, &i) in valid.iter().enumerate() {
                    alpha[i] = result.intercept[k];
                    beta[i] = result.slopes[[0, k]];
                }
            }
            Err(e) if e.is_recoverable() => warn!(%caldate, error = %e, "index regression failed"),
            Err(e) => return Err(e.into()),
        }
    }
    build_table(entities, vec![("HAlpha".to_string(), alpha), ("beta".to_string(), beta)])
}
