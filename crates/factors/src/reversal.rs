//! Amount-per-deal split reversal.

use tessera_calendar::resolve_date_index;
use tessera_math::compound;
use tessera_primitives::{Date, EntityId, FactorTable, Panel};

use crate::{FactorError, table::build_table};

/// Configuration for [`reversal`].
#[derive(Debug, Clone)]
pub struct ReversalConfig {
    /// Window lengths in trading days.
    pub windows: Vec<usize>,
}

impl Default for ReversalConfig {
    fn default() -> Self {
        Self { windows: vec![20, 60, 180] }
    }
}

/// `M_reverse_{W}` for each window `W` ending at `anchor`.
///
/// Within the window each entity's days with a known amount per deal are
/// ordered by that amount. The compounded return on the upper half of the
/// days minus the compounded return on the lower half is reported. With an
/// odd day count the middle day belongs to both halves. Entities with no
/// known amount per deal in the window are missing.
///
/// Windows are taken over `amt_per_deal`'s own dates and clamp at its first
/// column.
///
/// # Errors
/// Returns a calendar error if `anchor` precedes the panel and a lookup error
/// if `returns` lacks a window date.
pub fn reversal(
    anchor: Date,
    entities: &[EntityId],
    amt_per_deal: &Panel,
    returns: &Panel,
    config: &ReversalConfig,
) -> Result<FactorTable, FactorError> {
    let idx = resolve_date_index(anchor, amt_per_deal.dates())?;
    let mut columns = Vec::with_capacity(config.windows.len());
    for &window in &config.windows {
        let start = (idx + 1).saturating_sub(window);
        let dates = &amt_per_deal.dates()[start..=idx];
        let amounts = amt_per_deal.align(entities, dates)?;
        let rets = returns.align(entities, dates)?;

        let values = amounts
            .values()
            .rows()
            .into_iter()
            .zip(rets.values().rows())
            .map(|(a, r)| split_reversal(&a.to_vec(), &r.to_vec()))
            .collect();
        columns.push((format!("M_reverse_{window}"), values));
    }
    build_table(entities, columns)
}

/// Upper-half minus lower-half compounded return, days ranked by `amounts`.
fn split_reversal(amounts: &[f64], returns: &[f64]) -> f64 {
    let mut days: Vec<usize> = (0..amounts.len()).filter(|&j| !amounts[j].is_nan()).collect();
    if days.is_empty() {
        return f64::NAN;
    }
    days.sort_by(|&a, &b| amounts[a].total_cmp(&amounts[b]));

    let n = days.len();
    let low_len = if n % 2 == 1 { n / 2 + 1 } else { n / 2 };
    let pick = |idx: &[usize]| -> Vec<f64> { idx.iter().map(|&j| returns[j]).collect() };
    compound(&pick(&days[n / 2..])) - compound(&pick(&days[..low_len]))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::*;

    fn dates(n: usize) -> Vec<Date> {
        let start = Date::from_ymd_opt(2020, 1, 1).unwrap();
        start.iter_days().take(n).collect()
    }

    #[test]
    fn alternating_returns_split_by_amount() {
        // Large deals on up days, small deals on down days.
        let amounts: Vec<f64> = (0..20).map(|j| if j % 2 == 0 { 100.0 + j as f64 } else { j as f64 }).collect();
        let returns: Vec<f64> = (0..20).map(|j| if j % 2 == 0 { 0.01 } else { -0.01 }).collect();
        let expected = 1.01_f64.powi(10) - 0.99_f64.powi(10);
        assert_relative_eq!(split_reversal(&amounts, &returns), expected, epsilon = 1e-12);
    }

    #[rstest]
    #[case(&[1.0, 2.0, 3.0], &[0.1, 0.2, 0.3], 1.2 * 1.3 - 1.1 * 1.2)]
    #[case(&[5.0], &[0.1], 0.0)]
    #[case(&[f64::NAN, 2.0, 1.0], &[0.5, 0.2, 0.1], 0.2 - 0.1)]
    fn halves(#[case] amounts: &[f64], #[case] returns: &[f64], #[case] expected: f64) {
        assert_relative_eq!(split_reversal(amounts, returns), expected, epsilon = 1e-12);
    }

    #[test]
    fn no_amounts_is_missing() {
        assert!(split_reversal(&[f64::NAN, f64::NAN], &[0.1, 0.2]).is_nan());
    }

    #[test]
    fn windows_clamp_at_first_column() {
        let days = dates(30);
        let amounts = Panel::from_rows(days.clone(), vec![("A".into(), (0..30).map(f64::from).collect())]).unwrap();
        let returns = Panel::from_rows(days.clone(), vec![("A".into(), vec![0.0; 30])]).unwrap();
        let config = ReversalConfig { windows: vec![20, 180] };
        let table = reversal(days[29], &["A".into(), "B".into()], &amounts, &returns, &config).unwrap();
        assert_eq!(table.column("M_reverse_20").unwrap()[0], 0.0);
        assert_eq!(table.column("M_reverse_180").unwrap()[0], 0.0);
        assert!(table.column("M_reverse_180").unwrap()[1].is_nan());
    }
}
