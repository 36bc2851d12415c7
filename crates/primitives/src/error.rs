//! Error types for panel and table access.

use crate::Date;

/// Errors raised by panel and factor table operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    /// Entity is not a row of the panel.
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// Date is not a column of the panel.
    #[error("date not found: {0}")]
    DateNotFound(Date),

    /// Entity appears more than once.
    #[error("duplicate entity: {0}")]
    DuplicateEntity(String),

    /// Column dates are not strictly increasing.
    #[error("dates are not strictly increasing at {0}")]
    UnsortedDates(Date),

    /// Value matrix shape does not match the axes.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Expected (rows, columns).
        expected: (usize, usize),
        /// Actual (rows, columns).
        actual: (usize, usize),
    },

    /// Two panels were combined with different axes.
    #[error("panel axes differ")]
    AxisMismatch,

    /// Requested factor column is absent.
    #[error("missing column: {0}")]
    MissingColumn(String),

    /// Factor column added twice.
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    /// Column length does not match the number of rows.
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
}

impl PanelError {
    /// Returns whether this error comes from a lookup of an absent key.
    #[must_use]
    pub const fn is_lookup(&self) -> bool {
        matches!(self, Self::EntityNotFound(_) | Self::DateNotFound(_) | Self::MissingColumn(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PanelError::EntityNotFound("600000.SH".to_string());
        assert!(err.to_string().contains("600000.SH"));

        let err = PanelError::ShapeMismatch { expected: (2, 3), actual: (3, 2) };
        assert!(err.to_string().contains("(2, 3)"));
    }

    #[test]
    fn lookup_classification() {
        assert!(PanelError::MissingColumn("EP".to_string()).is_lookup());
        assert!(!PanelError::AxisMismatch.is_lookup());
    }
}
