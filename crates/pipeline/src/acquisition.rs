//! Trading calendar refresh through the acquisition collaborator.

use chrono::Duration;
use tessera_calendar::TradingCalendar;
use tessera_primitives::Date;
use tessera_traits::{DataProvider, PanelSource};
use tracing::{info, warn};

use crate::PipelineError;

/// First day requested when no calendar has been persisted yet.
pub const CALENDAR_START: Date = match Date::from_ymd_opt(2006, 1, 1) {
    Some(date) => date,
    None => panic!("invalid calendar start"),
};

/// Extend the persisted trading calendar up to `today`.
///
/// Trading days after the last persisted one are requested from `provider`,
/// retrying once. If both attempts fail the persisted calendar is returned
/// unchanged with a warning. New days are written back to `source`.
///
/// # Errors
/// Returns `Source` if the persisted calendar cannot be read or the extended
/// one cannot be written.
pub fn refresh_calendar<P, S>(provider: &P, source: &mut S, today: Date) -> Result<TradingCalendar, PipelineError>
where
    P: DataProvider,
    S: PanelSource,
{
    let persisted = match source.load_trade_days() {
        Ok(days) => days,
        Err(e) if e.is_not_found() => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    let mut calendar = TradingCalendar::from_unsorted(persisted);

    let start = calendar.last().map_or(CALENDAR_START, |last| last + Duration::days(1));
    if start > today {
        return Ok(calendar);
    }

    let fetched = provider.trade_days(start, today).or_else(|e| {
        warn!(start = %start, end = %today, error = %e, "trade day query failed, retrying");
        provider.trade_days(start, today)
    });
    let days = match fetched {
        Ok(days) => days,
        Err(e) => {
            warn!(error = %e, last = ?calendar.last(), "trade day refresh failed, keeping persisted calendar");
            return Ok(calendar);
        }
    };

    let added = calendar.extend(days);
    if added > 0 {
        source.save_trade_days(calendar.days())?;
        info!(added, last = ?calendar.last(), "extended trading calendar");
    }
    Ok(calendar)
}
