//! Calendar-date helpers.

use chrono::{Datelike, Days};
use tessera_primitives::Date;

/// First day of the month after `date`.
#[must_use]
pub fn first_of_next_month(date: Date) -> Date {
    let (y, m) = if date.month() == 12 { (date.year() + 1, 1) } else { (date.year(), date.month() + 1) };
    Date::from_ymd_opt(y, m, 1).unwrap_or(date)
}

/// Last calendar day of `date`'s month.
#[must_use]
pub fn month_end(date: Date) -> Date {
    first_of_next_month(date).checked_sub_days(Days::new(1)).unwrap_or(date)
}

/// Last calendar day of the month before `date`'s month.
#[must_use]
pub fn last_month_end(date: Date) -> Date {
    date.with_day(1).and_then(|d| d.pred_opt()).unwrap_or(date)
}

/// Fiscal year end governing a report dated `date`.
///
/// A December report closes its own fiscal year; any other report belongs to
/// a year whose last closed fiscal year ended the previous December 31.
#[must_use]
pub fn last_fiscal_year_end(date: Date) -> Option<Date> {
    if date.month() == 12 { Some(date) } else { Date::from_ymd_opt(date.year() - 1, 12, 31) }
}
