//! Error types for calendar resolution.

use tessera_primitives::Date;

/// Errors raised while resolving dates against a trading calendar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    /// Date precedes the calendar, or an offset walks off either end.
    #[error("date {0} is outside the trading calendar")]
    OutOfRange(Date),

    /// Date is not a member of the calendar.
    #[error("{0} is not a trading day")]
    NotATradingDay(Date),

    /// Date is not the last trading day of its month.
    #[error("{0} is not a month-end trading day")]
    NotPeriodEnd(Date),

    /// Calendar input is not strictly increasing.
    #[error("trading days are not strictly increasing at {0}")]
    Unsorted(Date),

    /// Caller passed arguments the operation does not accept.
    #[error("invalid usage: {0}")]
    Usage(String),
}

impl CalendarError {
    /// Returns whether the error means the requested date lies outside the
    /// available history.
    #[must_use]
    pub const fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange(_))
    }
}
