//! Error types for factor assembly.

use tessera_calendar::CalendarError;
use tessera_factors::FactorError;
use tessera_panel::StoreError;
use tessera_primitives::{Date, PanelError};
use tessera_traits::{AcquisitionError, SourceError};

/// Errors that can occur while assembling or persisting a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Panel store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Storage collaborator error outside the store cache.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Factor calculation error.
    #[error("factor error: {0}")]
    Factor(#[from] FactorError),

    /// Calendar resolution error.
    #[error("calendar error: {0}")]
    Calendar(#[from] CalendarError),

    /// Panel or table error.
    #[error("panel error: {0}")]
    Panel(#[from] PanelError),

    /// Acquisition collaborator error.
    #[error("acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    /// A declared target column was not produced.
    #[error("missing target column: {0}")]
    MissingColumn(String),

    /// A snapshot is already stored for the date.
    #[error("snapshot for {0} already exists")]
    SnapshotExists(Date),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl PipelineError {
    /// Returns whether a category can fall back to missing columns and let
    /// the date continue.
    ///
    /// Absent panels, absent dates or entities, degenerate regressions and
    /// short histories are recoverable. A date outside the calendar is not.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_not_found() || matches!(e, StoreError::Panel(p) if p.is_lookup()),
            Self::Source(e) => e.is_not_found(),
            Self::Factor(e) => e.is_recoverable(),
            Self::Calendar(e) => matches!(e, CalendarError::NotATradingDay(_) | CalendarError::NotPeriodEnd(_)),
            Self::Panel(e) => e.is_lookup(),
            Self::Acquisition(_)
            | Self::MissingColumn(_)
            | Self::SnapshotExists(_)
            | Self::Config(_) => false,
        }
    }
}
