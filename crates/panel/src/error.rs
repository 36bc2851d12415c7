//! Error types for the panel store.

use tessera_primitives::PanelError;
use tessera_traits::SourceError;

/// Errors raised by [`PanelStore`](crate::PanelStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No source has a panel with this name.
    #[error("panel not found: {0}")]
    NotFound(String),

    /// The storage collaborator failed.
    #[error("source error: {0}")]
    Source(SourceError),

    /// A derived panel could not be built.
    #[error("panel error: {0}")]
    Panel(#[from] PanelError),
}

impl From<SourceError> for StoreError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(name) => Self::NotFound(name),
            other => Self::Source(other),
        }
    }
}

impl StoreError {
    /// Returns whether the panel simply does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_lifted() {
        let err: StoreError = SourceError::NotFound("turn".to_string()).into();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("turn"));

        let err: StoreError = SourceError::Format("bad".to_string()).into();
        assert!(!err.is_not_found());
    }
}
