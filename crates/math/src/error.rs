//! Error types for numerical routines.

/// Errors raised by the regression engine and numerical helpers.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MathError {
    /// Fewer observations than parameters.
    #[error("insufficient observations: need {needed}, got {got}")]
    InsufficientObservations {
        /// Number of parameters to estimate.
        needed: usize,
        /// Number of observations supplied.
        got: usize,
    },

    /// Normal equations are singular or nearly so.
    #[error("design matrix is singular")]
    Singular,

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Input contains NaN or infinite values.
    #[error("non-finite input: {0}")]
    NonFinite(&'static str),

    /// Weights are negative, non-finite or sum to zero.
    #[error("invalid weights: {0}")]
    InvalidWeights(String),

    /// Empty data.
    #[error("empty data provided")]
    EmptyData,
}

impl MathError {
    /// Returns whether the error reflects degenerate data rather than misuse.
    ///
    /// Degenerate groups are reported as missing by callers; misuse aborts.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::DimensionMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = MathError::InsufficientObservations { needed: 3, got: 2 };
        assert!(err.to_string().contains('3') && err.to_string().contains('2'));

        let err = MathError::DimensionMismatch { expected: 10, actual: 5 };
        assert!(err.to_string().contains("10") && err.to_string().contains('5'));
    }

    #[test]
    fn recoverable_classification() {
        assert!(MathError::Singular.is_recoverable());
        assert!(MathError::NonFinite("y").is_recoverable());
        assert!(!MathError::DimensionMismatch { expected: 1, actual: 2 }.is_recoverable());
    }
}
