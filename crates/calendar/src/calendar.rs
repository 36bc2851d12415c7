//! The trading calendar.

use chrono::Datelike;
use tessera_primitives::Date;

use crate::{
    BoundaryPolicy, CalendarError, CalendarMap, PeriodUnit, exact_date_index, first_of_next_month,
    month_end, resolve_date_index, slice_lookback,
};

/// Strictly increasing, duplicate-free list of trading days.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradingCalendar {
    days: Vec<Date>,
}

impl TradingCalendar {
    /// Create a calendar from strictly increasing days.
    ///
    /// # Errors
    /// Returns `Unsorted` at the first day not after its predecessor.
    pub fn new(days: Vec<Date>) -> Result<Self, CalendarError> {
        if let Some(w) = days.windows(2).find(|w| w[0] >= w[1]) {
            return Err(CalendarError::Unsorted(w[1]));
        }
        Ok(Self { days })
    }

    /// Create a calendar from arbitrary input, sorting and deduplicating.
    #[must_use]
    pub fn from_unsorted(mut days: Vec<Date>) -> Self {
        days.sort_unstable();
        days.dedup();
        Self { days }
    }

    /// All trading days.
    #[must_use]
    pub fn days(&self) -> &[Date] {
        &self.days
    }

    /// Number of trading days.
    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// First trading day.
    #[must_use]
    pub fn first(&self) -> Option<Date> {
        self.days.first().copied()
    }

    /// Last trading day.
    #[must_use]
    pub fn last(&self) -> Option<Date> {
        self.days.last().copied()
    }

    /// Trading day at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Date> {
        self.days.get(index).copied()
    }

    /// See [`resolve_date_index`].
    ///
    /// # Errors
    /// Returns `OutOfRange` if `date` precedes the calendar.
    pub fn resolve(&self, date: Date) -> Result<usize, CalendarError> {
        resolve_date_index(date, &self.days)
    }

    /// The trading day `date` resolves to.
    ///
    /// # Errors
    /// Returns `OutOfRange` if `date` precedes the calendar.
    pub fn resolve_date(&self, date: Date) -> Result<Date, CalendarError> {
        self.resolve(date).map(|i| self.days[i])
    }

    /// See [`exact_date_index`].
    ///
    /// # Errors
    /// Returns `NotATradingDay` if `date` is not a member.
    pub fn exact(&self, date: Date) -> Result<usize, CalendarError> {
        exact_date_index(date, &self.days)
    }

    /// Whether `date` is a trading day.
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.days.binary_search(&date).is_ok()
    }

    /// See [`slice_lookback`].
    ///
    /// # Errors
    /// Returns `Usage` for a non-negative offset and `OutOfRange` if `anchor`
    /// precedes the calendar.
    pub fn lookback(
        &self,
        anchor: Date,
        offset: i32,
        unit: PeriodUnit,
        policy: BoundaryPolicy,
    ) -> Result<Vec<Date>, CalendarError> {
        slice_lookback(anchor, offset, unit, &self.days, policy)
    }

    /// The last `n` trading days ending at the day resolved for `anchor`,
    /// clamped at the first trading day.
    ///
    /// # Errors
    /// Returns `OutOfRange` if `anchor` precedes the calendar.
    pub fn trailing(&self, anchor: Date, n: usize) -> Result<&[Date], CalendarError> {
        let end = self.resolve(anchor)?;
        let start = (end + 1).saturating_sub(n);
        Ok(&self.days[start..=end])
    }

    /// The trading day `offset` positions from the day resolved for `date`.
    ///
    /// # Errors
    /// Returns `OutOfRange` if `date` precedes the calendar or the shifted
    /// position falls outside it.
    pub fn shift(&self, date: Date, offset: isize) -> Result<Date, CalendarError> {
        let idx = self.resolve(date)?;
        idx.checked_add_signed(offset)
            .and_then(|i| self.days.get(i).copied())
            .ok_or(CalendarError::OutOfRange(date))
    }

    /// Trading days in `[start, end]`.
    #[must_use]
    pub fn between(&self, start: Date, end: Date) -> &[Date] {
        let lo = self.days.partition_point(|d| *d < start);
        let hi = self.days.partition_point(|d| *d <= end);
        if lo >= hi { &[] } else { &self.days[lo..hi] }
    }

    /// Last trading day of each completed period.
    ///
    /// A period is complete once a later trading day falls outside it, so the
    /// final, possibly partial period is excluded. `Day` returns every day.
    #[must_use]
    pub fn period_ends(&self, unit: PeriodUnit) -> Vec<Date> {
        let closes = |d: Date| match unit {
            PeriodUnit::Day | PeriodUnit::Month => true,
            PeriodUnit::Quarter => d.month() % 3 == 0,
            PeriodUnit::Year => d.month() == 12,
        };
        if unit == PeriodUnit::Day {
            return self.days.clone();
        }
        self.days
            .windows(2)
            .filter(|w| w[0].month() != w[1].month() && closes(w[0]))
            .map(|w| w[0])
            .collect()
    }

    /// Whether `date` is the last trading day of its month.
    ///
    /// The final calendar entry counts only if it is the calendar month end.
    #[must_use]
    pub fn is_month_end(&self, date: Date) -> bool {
        match self.days.binary_search(&date) {
            Ok(i) => match self.days.get(i + 1) {
                Some(next) => next.month() != date.month() || next.year() != date.year(),
                None => month_end(date) == date,
            },
            Err(_) => false,
        }
    }

    /// First trading day in the month after `date`'s month.
    #[must_use]
    pub fn next_month_first(&self, date: Date) -> Option<Date> {
        let start = first_of_next_month(date);
        let idx = self.days.partition_point(|d| *d < start);
        self.days.get(idx).filter(|d| month_end(**d) == month_end(start)).copied()
    }

    /// Append days after the current last day, returning how many were added.
    ///
    /// Days on or before the last trading day are ignored.
    pub fn extend(&mut self, new_days: impl IntoIterator<Item = Date>) -> usize {
        let mut added: Vec<Date> = match self.last() {
            Some(last) => new_days.into_iter().filter(|d| *d > last).collect(),
            None => new_days.into_iter().collect(),
        };
        added.sort_unstable();
        added.dedup();
        let n = added.len();
        self.days.extend(added);
        n
    }

    /// Month-end trading day to calendar month-end map.
    #[must_use]
    pub fn month_map(&self) -> CalendarMap {
        CalendarMap::from_calendar(self)
    }
}
