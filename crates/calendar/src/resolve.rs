//! Date resolution against a sorted list of trading days.

use chrono::{Days, Months};
use serde::{Deserialize, Serialize};
use tessera_primitives::Date;

use crate::{CalendarError, first_of_next_month};

/// Unit of a lookback offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodUnit {
    /// Raw calendar days, never normalized.
    Day,
    /// Calendar months.
    Month,
    /// Calendar quarters (three months).
    Quarter,
    /// Calendar years.
    Year,
}

/// How the start of a month-based lookback window is placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Start at the first day of the month after the raw offset date, so a
    /// window covers whole months.
    #[default]
    NextMonthStart,
    /// Start at the raw offset date.
    Raw,
}

/// Position of `date` in `days`, or of the latest day strictly before it.
///
/// Dates after the last trading day resolve to the last index.
///
/// # Errors
/// Returns `OutOfRange` if `date` precedes the first trading day or `days`
/// is empty.
pub fn resolve_date_index(date: Date, days: &[Date]) -> Result<usize, CalendarError> {
    match days.binary_search(&date) {
        Ok(idx) => Ok(idx),
        Err(0) => Err(CalendarError::OutOfRange(date)),
        Err(idx) => Ok(idx - 1),
    }
}

/// Position of `date` in `days`, requiring an exact match.
///
/// # Errors
/// Returns `NotATradingDay` if `date` is not a member.
pub fn exact_date_index(date: Date, days: &[Date]) -> Result<usize, CalendarError> {
    days.binary_search(&date).map_err(|_| CalendarError::NotATradingDay(date))
}

/// Trading days covering `|offset|` periods back from `anchor`, ending at the
/// trading day resolved for `anchor` (inclusive).
///
/// For month, quarter and year units under [`BoundaryPolicy::NextMonthStart`]
/// the raw start `anchor - |offset|` is moved to the first day of the
/// following month and the slice begins at the first trading day on or after
/// it. Day offsets are used as-is.
///
/// # Errors
/// Returns `Usage` for a non-negative offset and `OutOfRange` if `anchor`
/// precedes the calendar.
pub fn slice_lookback(
    anchor: Date,
    offset: i32,
    unit: PeriodUnit,
    days: &[Date],
    policy: BoundaryPolicy,
) -> Result<Vec<Date>, CalendarError> {
    if offset >= 0 {
        return Err(CalendarError::Usage(format!(
            "lookback offset must be negative, got {offset}"
        )));
    }
    let end = resolve_date_index(anchor, days)?;
    let n = offset.unsigned_abs();

    let raw_start = match unit {
        PeriodUnit::Day => anchor.checked_sub_days(Days::new(u64::from(n))),
        PeriodUnit::Month => anchor.checked_sub_months(Months::new(n)),
        PeriodUnit::Quarter => anchor.checked_sub_months(Months::new(n * 3)),
        PeriodUnit::Year => anchor.checked_sub_months(Months::new(n * 12)),
    }
    .ok_or(CalendarError::OutOfRange(anchor))?;

    let start = match (unit, policy) {
        (PeriodUnit::Day, _) | (_, BoundaryPolicy::Raw) => raw_start,
        (_, BoundaryPolicy::NextMonthStart) => first_of_next_month(raw_start),
    };

    let start_idx = days.partition_point(|d| *d < start);
    if start_idx > end {
        return Ok(Vec::new());
    }
    Ok(days[start_idx..=end].to_vec())
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;
    use rstest::rstest;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    /// Weekdays between two dates inclusive.
    fn weekdays(start: Date, end: Date) -> Vec<Date> {
        use chrono::Datelike;
        start
            .iter_days()
            .take_while(|x| *x <= end)
            .filter(|x| !matches!(x.weekday(), Weekday::Sat | Weekday::Sun))
            .collect()
    }

    #[test]
    fn resolves_member_exactly() {
        let days = weekdays(d(2020, 1, 1), d(2020, 3, 31));
        for (i, day) in days.iter().enumerate() {
            assert_eq!(resolve_date_index(*day, &days).unwrap(), i);
        }
    }

    #[test]
    fn resolves_non_member_to_previous() {
        let days = weekdays(d(2020, 1, 1), d(2020, 3, 31));
        // 2020-01-04 is a Saturday
        let idx = resolve_date_index(d(2020, 1, 4), &days).unwrap();
        assert_eq!(days[idx], d(2020, 1, 3));
        assert!(days[idx] < d(2020, 1, 4));
        assert!(days[idx + 1] > d(2020, 1, 4));
    }

    #[test]
    fn resolves_after_last_to_last() {
        let days = weekdays(d(2020, 1, 1), d(2020, 1, 31));
        assert_eq!(resolve_date_index(d(2020, 6, 1), &days).unwrap(), days.len() - 1);
    }

    #[test]
    fn before_first_is_out_of_range() {
        let days = weekdays(d(2020, 1, 1), d(2020, 1, 31));
        assert_eq!(
            resolve_date_index(d(2019, 12, 31), &days).unwrap_err(),
            CalendarError::OutOfRange(d(2019, 12, 31))
        );
        assert!(resolve_date_index(d(2020, 1, 1), &[]).is_err());
    }

    #[test]
    fn exact_requires_member() {
        let days = weekdays(d(2020, 1, 1), d(2020, 1, 31));
        assert_eq!(exact_date_index(d(2020, 1, 2), &days).unwrap(), 1);
        assert_eq!(
            exact_date_index(d(2020, 1, 4), &days).unwrap_err(),
            CalendarError::NotATradingDay(d(2020, 1, 4))
        );
    }

    #[rstest]
    #[case(1, PeriodUnit::Month)]
    #[case(3, PeriodUnit::Month)]
    #[case(12, PeriodUnit::Month)]
    #[case(1, PeriodUnit::Quarter)]
    #[case(1, PeriodUnit::Year)]
    fn lookback_starts_on_month_boundary(#[case] n: i32, #[case] unit: PeriodUnit) {
        use chrono::Datelike;
        let days = weekdays(d(2018, 1, 1), d(2020, 12, 31));
        let anchor = d(2020, 6, 30);
        let slice =
            slice_lookback(anchor, -n, unit, &days, BoundaryPolicy::NextMonthStart).unwrap();

        let first = slice[0];
        let prev = days[days.binary_search(&first).unwrap() - 1];
        assert_ne!(first.month(), prev.month());
        assert_eq!(*slice.last().unwrap(), anchor);
    }

    #[test]
    fn one_month_lookback_covers_anchor_month() {
        let days = weekdays(d(2020, 1, 1), d(2020, 12, 31));
        let slice =
            slice_lookback(d(2020, 6, 30), -1, PeriodUnit::Month, &days, BoundaryPolicy::default())
                .unwrap();
        assert_eq!(slice.first(), Some(&d(2020, 6, 1)));
        assert_eq!(slice.last(), Some(&d(2020, 6, 30)));
        assert_eq!(slice.len(), 22);
    }

    #[test]
    fn raw_policy_keeps_offset_date() {
        let days = weekdays(d(2020, 1, 1), d(2020, 12, 31));
        // 2020-05-15 is a Friday
        let slice =
            slice_lookback(d(2020, 6, 15), -1, PeriodUnit::Month, &days, BoundaryPolicy::Raw)
                .unwrap();
        assert_eq!(slice.first(), Some(&d(2020, 5, 15)));
    }

    #[test]
    fn day_unit_is_not_normalized() {
        let days = weekdays(d(2020, 1, 1), d(2020, 12, 31));
        let slice =
            slice_lookback(d(2020, 6, 30), -10, PeriodUnit::Day, &days, BoundaryPolicy::default())
                .unwrap();
        assert_eq!(slice.first(), Some(&d(2020, 6, 22)));
    }

    #[test]
    fn month_arithmetic_clamps() {
        let days = weekdays(d(2020, 1, 1), d(2020, 12, 31));
        // 2020-03-31 minus one month is 2020-02-29, normalized to 2020-03-01.
        let slice =
            slice_lookback(d(2020, 3, 31), -1, PeriodUnit::Month, &days, BoundaryPolicy::default())
                .unwrap();
        assert_eq!(slice.first(), Some(&d(2020, 3, 2)));
    }

    #[rstest]
    #[case(0)]
    #[case(3)]
    fn non_negative_offset_is_usage_error(#[case] offset: i32) {
        let days = weekdays(d(2020, 1, 1), d(2020, 12, 31));
        let err =
            slice_lookback(d(2020, 6, 30), offset, PeriodUnit::Month, &days, BoundaryPolicy::Raw)
                .unwrap_err();
        assert!(matches!(err, CalendarError::Usage(_)));
    }
}
