//! Sequential runs over many anchor dates.

use chrono::{Datelike, Duration, Weekday};
use tessera_calendar::{PeriodUnit, TradingCalendar};
use tessera_primitives::Date;
use tessera_traits::PanelSource;
use tracing::{error, info, warn};

use crate::{FactorPipeline, Frequency, PipelineError};

/// Outcome of [`FactorPipeline::run_batch`].
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Dates whose snapshot was written.
    pub written: Vec<Date>,
    /// Dates whose snapshot already existed.
    pub skipped: Vec<Date>,
    /// Dates that failed, with the error.
    pub failed: Vec<(Date, PipelineError)>,
}

impl BatchReport {
    /// Whether no date failed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<S: PanelSource> FactorPipeline<S> {
    /// Run every date in order.
    ///
    /// A failing date is logged and recorded; the remaining dates still run.
    pub fn run_batch(&mut self, dates: &[Date]) -> BatchReport {
        let mut report = BatchReport::default();
        for &date in dates {
            match self.run_date(date) {
                Ok(tdate) => {
                    info!(date = %tdate, "snapshot written");
                    report.written.push(tdate);
                }
                Err(PipelineError::SnapshotExists(tdate)) => {
                    warn!(date = %tdate, "snapshot already exists, skipping");
                    report.skipped.push(tdate);
                }
                Err(e) => {
                    error!(date = %date, error = %e, "snapshot failed");
                    report.failed.push((date, e));
                }
            }
        }
        info!(
            written = report.written.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "batch finished"
        );
        report
    }
}

/// Anchor dates of a run started on `today` without explicit dates.
///
/// Monthly runs take the last two completed month-end trading days on or
/// before `today`. Weekly runs take the latest Thursday on or before `today`.
#[must_use]
pub fn default_dates(frequency: Frequency, calendar: &TradingCalendar, today: Date) -> Vec<Date> {
    match frequency {
        Frequency::Monthly => {
            let ends: Vec<Date> =
                calendar.period_ends(PeriodUnit::Month).into_iter().filter(|d| *d <= today).collect();
            ends[ends.len().saturating_sub(2)..].to_vec()
        }
        Frequency::Weekly => {
            let days_back = (today.weekday().num_days_from_monday() + 7
                - Weekday::Thu.num_days_from_monday())
                % 7;
            vec![today - Duration::days(i64::from(days_back))]
        }
    }
}
