//! Turnover quality mask and sentinel-aware window reducers.
//!
//! The mask separates three situations that raw turnover conflates: a genuine
//! observation, a listed entity that could not trade (explicit zero), and an
//! entity with no information at all (the sentinel). Window reducers stop at
//! the first sentinel and report missing unless the whole window is usable.

use tessera_math::nan_mean;
use tessera_primitives::Panel;

use crate::FactorError;

/// Default sentinel marking "not listed / no information".
pub const DEFAULT_SENTINEL: f64 = 1000.0;

/// Build the tri-state turnover panel.
///
/// `status`, `limit` and `listed` are aligned to `raw`'s entities and dates.
/// Per cell:
/// - not listed (`listed != 1` or missing) gives `sentinel`;
/// - normal trading (`status == 1`) and not limit-locked (`limit == 0`) keeps
///   the raw value, or gives `sentinel` when the raw value is missing;
/// - otherwise (listed but suspended or limit-locked) gives `0`.
///
/// # Errors
/// Returns a lookup error if any of the flag panels lacks an entity or date
/// of `raw`.
pub fn build_turnover_mask(
    raw: &Panel,
    status: &Panel,
    limit: &Panel,
    listed: &Panel,
    sentinel: f64,
) -> Result<Panel, FactorError> {
    let status = status.select(raw.entities(), raw.dates())?;
    let limit = limit.select(raw.entities(), raw.dates())?;
    let listed = listed.select(raw.entities(), raw.dates())?;

    let tradable = status.zip_with(&limit, |&s, &l| s == 1.0 && l == 0.0)?;
    let flags = tradable.zip_with(&listed, |&t, &l| (t, l == 1.0))?;
    Ok(raw.zip_with(&flags, |&value, &(tradable, listed)| {
        if !listed {
            sentinel
        } else if tradable {
            if value.is_nan() { sentinel } else { value }
        } else {
            0.0
        }
    })?)
}

/// Apply `reducer` when no value in `values` reaches the sentinel; missing
/// otherwise.
///
/// Missing values do not interrupt the run; the reducer sees them.
pub fn sentinel_guarded(values: &[f64], sentinel: f64, reducer: impl Fn(&[f64]) -> f64) -> f64 {
    let run = values.iter().take_while(|v| v.is_nan() || **v < sentinel).count();
    if run == values.len() { reducer(values) } else { f64::NAN }
}

/// [`sentinel_guarded`] nan-mean.
#[must_use]
pub fn sentinel_mean(values: &[f64], sentinel: f64) -> f64 {
    sentinel_guarded(values, sentinel, nan_mean)
}
