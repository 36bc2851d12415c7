//! Multi-year growth rate of a fundamental metric.

use tessera_calendar::{last_fiscal_year_end, resolve_date_index};
use tessera_math::{fit_simple, safe_div};
use tessera_primitives::{Date, DatePanel, EntityId, Panel};

use crate::FactorError;

/// Configuration for [`fiscal_growth_rate`].
#[derive(Debug, Clone, Copy)]
pub struct GrowthConfig {
    /// Number of fiscal years fitted.
    pub periods: usize,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self { periods: 5 }
    }
}

/// Growth of `metric` over the fiscal years ending at each entity's last
/// closed fiscal year.
///
/// The report date applicable at `caldate` determines the last fiscal year
/// end. `metric` is resampled to its last observation per calendar year, and
/// the `periods` year-end values ending at that fiscal year are regressed on
/// `1..=periods`. The rate is the slope over the mean of those values.
///
/// An entity is missing when it has no report date or metric row, when fewer
/// than `periods` years are available, when any of them is missing, or when
/// the fit is degenerate.
///
/// # Errors
/// Returns a lookup error if `report_dates` has no column for `caldate`.
pub fn fiscal_growth_rate(
    caldate: Date,
    entities: &[EntityId],
    metric: &Panel,
    report_dates: &DatePanel,
    config: GrowthConfig,
) -> Result<Vec<f64>, FactorError> {
    let reports = report_dates.cross_section_or_missing(entities, caldate)?;
    let yearly = metric.last_per_year();

    Ok(entities
        .iter()
        .zip(reports)
        .map(|(entity, report)| {
            let Some(fiscal_end) = report.and_then(last_fiscal_year_end) else {
                return f64::NAN;
            };
            let Ok(row) = yearly.row(entity) else {
                return f64::NAN;
            };
            let Ok(idx) = resolve_date_index(fiscal_end, yearly.dates()) else {
                return f64::NAN;
            };
            if idx + 1 < config.periods {
                return f64::NAN;
            }
            let values = row.slice(ndarray::s![idx + 1 - config.periods..=idx]).to_vec();
            growth_rate(&values)
        })
        .collect())
}

/// `slope / mean` of `values` regressed on `1..=n`.
fn growth_rate(values: &[f64]) -> f64 {
    if values.is_empty() || values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let x: Vec<f64> = (1..=values.len()).map(|i| i as f64).collect();
    match fit_simple(&x, values, None) {
        Ok(line) => safe_div(line.slope, values.iter().sum::<f64>() / values.len() as f64),
        Err(_) => f64::NAN,
    }
}
