//! Market-data acquisition trait.

use polars::prelude::{DataFrame, PolarsError};
use tessera_primitives::{Date, EntityId};

/// Errors raised by a data provider.
#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    /// The vendor rejected the query.
    #[error("query failed with code {code}: {context}")]
    QueryFailed {
        /// Vendor error code.
        code: i64,
        /// What was being queried.
        context: String,
    },

    /// The vendor response could not be converted.
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Shape of a vendor query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// One value per entity and indicator at the end of the period.
    CrossSection,
    /// One value per entity for every trading day of the period.
    TimeSeries,
}

/// Fetches raw indicator data from a market-data vendor.
pub trait DataProvider {
    /// Fetch `indicators` for `entities` over `[start, end]`.
    ///
    /// The frame has one row per entity code (column `code`) and one
    /// lower-cased column per indicator.
    ///
    /// # Errors
    /// Returns `QueryFailed` with the vendor code on rejection.
    fn fetch(
        &self,
        entities: &[EntityId],
        indicators: &[&str],
        start: Date,
        end: Date,
        kind: QueryKind,
    ) -> Result<DataFrame, AcquisitionError>;

    /// Trading days in `[start, end]`.
    ///
    /// # Errors
    /// Returns `QueryFailed` with the vendor code on rejection.
    fn trade_days(&self, start: Date, end: Date) -> Result<Vec<Date>, AcquisitionError>;
}
