//! Average turnover and its bias against a long baseline.

use tessera_calendar::{BoundaryPolicy, PeriodUnit, TradingCalendar};
use tessera_math::safe_div;
use tessera_primitives::{Date, EntityId, FactorTable, Panel};

use crate::{
    DEFAULT_SENTINEL, FactorError,
    table::{build_table, per_row},
    turnover::sentinel_mean,
};

/// Configuration for [`turnover_bias`].
#[derive(Debug, Clone)]
pub struct TurnoverConfig {
    /// Lookbacks in months.
    pub lookbacks: Vec<u32>,
    /// Baseline length in years.
    pub baseline_years: u32,
    /// Placement of each window's first day.
    pub policy: BoundaryPolicy,
    /// Sentinel used by the turnover mask.
    pub sentinel: f64,
}

impl Default for TurnoverConfig {
    fn default() -> Self {
        Self {
            lookbacks: vec![1, 3, 6, 12],
            baseline_years: 2,
            policy: BoundaryPolicy::NextMonthStart,
            sentinel: DEFAULT_SENTINEL,
        }
    }
}

/// `turn_{L}m` and `bias_turn_{L}m` from the masked turnover panel.
///
/// `turn_{L}m` is the sentinel-guarded mean over the lookback;
/// `bias_turn_{L}m` is its ratio to the same mean over the baseline, minus
/// one.
///
/// # Errors
/// Returns a calendar error if `anchor` precedes the calendar and a lookup
/// error if `masked` lacks a window date.
pub fn turnover_bias(
    calendar: &TradingCalendar,
    anchor: Date,
    entities: &[EntityId],
    masked: &Panel,
    config: &TurnoverConfig,
) -> Result<FactorTable, FactorError> {
    let sentinel = config.sentinel;
    let average = |dates: &[Date]| -> Result<Vec<f64>, FactorError> {
        let window = masked.align(entities, dates)?;
        Ok(per_row(&window, |row| sentinel_mean(row, sentinel)))
    };

    let baseline_dates =
        calendar.lookback(anchor, -(config.baseline_years as i32), PeriodUnit::Year, config.policy)?;
    let baseline = average(&baseline_dates)?;

    let mut columns = Vec::with_capacity(config.lookbacks.len() * 2);
    for &months in &config.lookbacks {
        let dates = calendar.lookback(anchor, -(months as i32), PeriodUnit::Month, config.policy)?;
        let turn = average(&dates)?;
        let bias = turn.iter().zip(&baseline).map(|(t, b)| safe_div(*t, *b) - 1.0).collect();
        columns.push((format!("turn_{months}m"), turn));
        columns.push((format!("bias_turn_{months}m"), bias));
    }
    build_table(entities, columns)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::Datelike;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn setup() -> (TradingCalendar, Panel) {
        let days: Vec<Date> = d(2018, 1, 1)
            .iter_days()
            .take_while(|x| *x <= d(2020, 6, 30))
            .filter(|x| x.weekday().num_days_from_monday() < 5)
            .collect();
        // A trades at 1.0 until 2020, then at 2.0. B is unlisted until June 2020.
        let a = days.iter().map(|x| if x.year() < 2020 { 1.0 } else { 2.0 }).collect();
        let b = days
            .iter()
            .map(|x| if *x < d(2020, 6, 1) { DEFAULT_SENTINEL } else { 0.0 })
            .collect();
        let panel = Panel::from_rows(days.clone(), vec![("A".into(), a), ("B".into(), b)]).unwrap();
        (TradingCalendar::new(days).unwrap(), panel)
    }

    #[test]
    fn bias_against_two_year_baseline() {
        let (calendar, panel) = setup();
        let config = TurnoverConfig { lookbacks: vec![1], ..Default::default() };
        let table =
            turnover_bias(&calendar, d(2020, 6, 30), &["A".into()], &panel, &config).unwrap();

        let turn = table.column("turn_1m").unwrap()[0];
        assert_relative_eq!(turn, 2.0);

        let baseline: Vec<f64> = calendar
            .lookback(d(2020, 6, 30), -2, PeriodUnit::Year, BoundaryPolicy::NextMonthStart)
            .unwrap()
            .iter()
            .map(|x| if x.year() < 2020 { 1.0 } else { 2.0 })
            .collect();
        let base = baseline.iter().sum::<f64>() / baseline.len() as f64;
        assert_relative_eq!(table.column("bias_turn_1m").unwrap()[0], 2.0 / base - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn sentinel_in_window_is_missing() {
        let (calendar, panel) = setup();
        let config = TurnoverConfig { lookbacks: vec![1, 3], ..Default::default() };
        let table = turnover_bias(&calendar, d(2020, 6, 30), &["B".into()], &panel, &config).unwrap();
        // June alone is clean zero turnover; the baseline is not.
        assert_eq!(table.column("turn_1m").unwrap()[0], 0.0);
        assert!(table.column("turn_3m").unwrap()[0].is_nan());
        assert!(table.column("bias_turn_1m").unwrap()[0].is_nan());
    }
}
