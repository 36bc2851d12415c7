//! Panel persistence trait.

use polars::prelude::PolarsError;
use tessera_primitives::{
    Date, DatePanel, FactorSnapshot, LabelPanel, Panel, PanelError, Universe,
};

/// Errors raised by a panel source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// No stored object has this name.
    #[error("not found: {0}")]
    NotFound(String),

    /// Indicator has no storage category registered.
    #[error("indicator not registered: {0}")]
    Unregistered(String),

    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data does not have the expected layout.
    #[error("format error: {0}")]
    Format(String),

    /// Polars error while reading or writing.
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    /// Stored data violates panel invariants.
    #[error("panel error: {0}")]
    Panel(#[from] PanelError),
}

impl SourceError {
    /// Returns whether the requested object does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Reads and writes whole indicator panels and factor snapshots.
///
/// Writes always replace the entire stored object for a name.
pub trait PanelSource {
    /// Load a numeric panel.
    ///
    /// # Errors
    /// Returns `NotFound` if no panel has this name.
    fn load(&self, name: &str) -> Result<Panel, SourceError>;

    /// Load a label panel.
    ///
    /// # Errors
    /// Returns `NotFound` if no panel has this name.
    fn load_labels(&self, name: &str) -> Result<LabelPanel, SourceError>;

    /// Load a report-date panel.
    ///
    /// # Errors
    /// Returns `NotFound` if no panel has this name.
    fn load_dates(&self, name: &str) -> Result<DatePanel, SourceError>;

    /// Persist a numeric panel, replacing any stored version.
    ///
    /// # Errors
    /// Returns an error if the panel cannot be written.
    fn save(&mut self, name: &str, panel: &Panel) -> Result<(), SourceError>;

    /// Persist a computed factor snapshot.
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be written.
    fn save_snapshot(&mut self, snapshot: &FactorSnapshot) -> Result<(), SourceError>;

    /// Load a previously persisted factor snapshot.
    ///
    /// # Errors
    /// Returns `NotFound` if no snapshot exists for `date`.
    fn load_snapshot(&self, date: Date) -> Result<FactorSnapshot, SourceError>;

    /// Whether a snapshot exists for `date`.
    fn has_snapshot(&self, date: Date) -> bool;

    /// Load entity listing metadata.
    ///
    /// # Errors
    /// Returns `NotFound` if no metadata is stored.
    fn load_meta(&self) -> Result<Universe, SourceError>;

    /// Load the persisted trading calendar.
    ///
    /// # Errors
    /// Returns `NotFound` if no calendar is stored.
    fn load_trade_days(&self) -> Result<Vec<Date>, SourceError>;

    /// Persist the trading calendar, replacing the stored one.
    ///
    /// # Errors
    /// Returns an error if the calendar cannot be written.
    fn save_trade_days(&mut self, days: &[Date]) -> Result<(), SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(SourceError::NotFound("pe_ttm".to_string()).is_not_found());
        assert!(!SourceError::Format("bad header".to_string()).is_not_found());

        let err: SourceError = PanelError::AxisMismatch.into();
        assert!(err.to_string().contains("axes"));
    }
}
