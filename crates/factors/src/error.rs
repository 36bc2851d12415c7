//! Error types for factor reducers.

use tessera_calendar::CalendarError;
use tessera_math::MathError;
use tessera_primitives::PanelError;

/// Errors that can occur while computing a factor group.
#[derive(Debug, thiserror::Error)]
pub enum FactorError {
    /// Panel lookup or shape error.
    #[error("panel error: {0}")]
    Panel(#[from] PanelError),

    /// Date resolution error.
    #[error("calendar error: {0}")]
    Calendar(#[from] CalendarError),

    /// Math operation error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// The calendar does not reach back far enough for the window.
    #[error("insufficient history: need {needed} periods, got {got}")]
    InsufficientHistory {
        /// Periods required.
        needed: usize,
        /// Periods available.
        got: usize,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FactorError {
    /// Returns whether the caller may replace the group's output with
    /// missing values and carry on.
    ///
    /// Dates outside the calendar and caller misuse are not recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Panel(e) => e.is_lookup(),
            Self::Calendar(e) => matches!(
                e,
                CalendarError::NotATradingDay(_) | CalendarError::NotPeriodEnd(_)
            ),
            Self::Math(e) => e.is_recoverable(),
            Self::InsufficientHistory { .. } => true,
            Self::InvalidConfig(_) => false,
        }
    }
}
