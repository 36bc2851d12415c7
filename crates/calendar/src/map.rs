//! Month-end trading day ↔ calendar month-end mapping.

use std::collections::BTreeMap;

use tessera_primitives::Date;

use crate::{CalendarError, PeriodUnit, TradingCalendar, month_end};

/// Pairs each month-end trading day with its calendar month end.
///
/// Monthly panels are keyed by calendar month end while daily panels are keyed
/// by trading day; this map translates between the two.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalendarMap {
    to_calendar: BTreeMap<Date, Date>,
    to_trading: BTreeMap<Date, Date>,
}

impl CalendarMap {
    /// Build the map from the completed months of `calendar`.
    ///
    /// The final trading day is included when it is itself a calendar month
    /// end.
    #[must_use]
    pub fn from_calendar(calendar: &TradingCalendar) -> Self {
        let mut ends = calendar.period_ends(PeriodUnit::Month);
        if let Some(last) = calendar.last().filter(|d| month_end(*d) == *d) {
            ends.push(last);
        }

        let to_calendar: BTreeMap<Date, Date> = ends.into_iter().map(|t| (t, month_end(t))).collect();
        let to_trading = to_calendar.iter().map(|(t, c)| (*c, *t)).collect();
        Self { to_calendar, to_trading }
    }

    /// Calendar month end for a month-end trading day.
    ///
    /// # Errors
    /// Returns `NotPeriodEnd` if `tdate` is not a month-end trading day.
    pub fn calendar_date(&self, tdate: Date) -> Result<Date, CalendarError> {
        self.to_calendar.get(&tdate).copied().ok_or(CalendarError::NotPeriodEnd(tdate))
    }

    /// Month-end trading day for a calendar month end.
    #[must_use]
    pub fn trading_date(&self, caldate: Date) -> Option<Date> {
        self.to_trading.get(&caldate).copied()
    }

    /// Number of months mapped.
    #[must_use]
    pub fn len(&self) -> usize {
        self.to_calendar.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_calendar.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn calendar() -> TradingCalendar {
        TradingCalendar::new(vec![
            d(2020, 1, 30),
            d(2020, 1, 31),
            d(2020, 2, 27),
            d(2020, 2, 28),
            d(2020, 3, 2),
            d(2020, 3, 31),
        ])
        .unwrap()
    }

    #[test]
    fn maps_both_ways() {
        let map = CalendarMap::from_calendar(&calendar());
        assert_eq!(map.calendar_date(d(2020, 2, 28)).unwrap(), d(2020, 2, 29));
        assert_eq!(map.trading_date(d(2020, 2, 29)), Some(d(2020, 2, 28)));
        assert_eq!(map.calendar_date(d(2020, 3, 31)).unwrap(), d(2020, 3, 31));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn rejects_mid_month_dates() {
        let map = calendar().month_map();
        assert_eq!(
            map.calendar_date(d(2020, 2, 27)).unwrap_err(),
            CalendarError::NotPeriodEnd(d(2020, 2, 27))
        );
        assert_eq!(map.trading_date(d(2020, 4, 30)), None);
    }
}
