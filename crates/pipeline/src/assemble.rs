//! Per-date snapshot assembly.

use std::sync::Arc;

use tessera_calendar::{CalendarMap, TradingCalendar, last_month_end, month_end};
use tessera_panel::PanelStore;
use tessera_primitives::{Date, FactorSnapshot, FactorTable, Panel, PanelError, Universe};
use tessera_traits::PanelSource;
use tracing::{debug, info};

use crate::{
    Category, Frequency, PipelineConfig, PipelineError, basic,
    categories::{self, Context},
    target_columns,
};

/// Dates derived from an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AnchorDates {
    /// Trading day the anchor resolves to.
    pub(crate) tdate: Date,
    /// Date at which valuation and identification panels are read.
    pub(crate) value_date: Date,
    /// Calendar month end at which monthly fundamentals are read.
    pub(crate) report_month: Date,
    /// Whether `tdate` is the last trading day of its month.
    pub(crate) month_end: bool,
}

impl AnchorDates {
    /// Resolve `anchor` against the calendar.
    ///
    /// Monthly runs read every monthly panel at the calendar month end of a
    /// month-end anchor, or at the previous month end otherwise. Weekly runs
    /// read daily snapshots at the trading day and fundamentals at the latest
    /// completed calendar month end.
    pub(crate) fn resolve(
        anchor: Date,
        calendar: &TradingCalendar,
        map: &CalendarMap,
        frequency: Frequency,
    ) -> Result<Self, PipelineError> {
        let tdate = calendar.resolve_date(anchor)?;
        let month_end_day = calendar.is_month_end(tdate);
        let dates = match frequency {
            Frequency::Monthly => {
                let caldate =
                    if month_end_day { map.calendar_date(tdate)? } else { last_month_end(tdate) };
                Self { tdate, value_date: caldate, report_month: caldate, month_end: month_end_day }
            }
            Frequency::Weekly => {
                let report_month =
                    if month_end(tdate) == tdate { tdate } else { last_month_end(tdate) };
                Self { tdate, value_date: tdate, report_month, month_end: month_end_day }
            }
        };
        Ok(dates)
    }
}

/// Assembles factor snapshots from the panels of one source.
///
/// The pipeline owns the panel cache, the trading calendar and the listing
/// metadata loaded at construction. Snapshots are computed one date at a time
/// and share the cache, so a batch of dates reads each panel once.
#[derive(Debug)]
pub struct FactorPipeline<S> {
    store: PanelStore<S>,
    calendar: TradingCalendar,
    map: CalendarMap,
    universe: Universe,
    config: PipelineConfig,
    masked_turnover: Option<Arc<Panel>>,
}

impl<S: PanelSource> FactorPipeline<S> {
    /// Create a pipeline over `source`, loading its calendar and metadata.
    ///
    /// # Errors
    /// Returns `Source` if the calendar or metadata is not stored, and
    /// `Calendar` if the stored calendar is not strictly increasing.
    pub fn new(source: S, config: PipelineConfig) -> Result<Self, PipelineError> {
        let calendar = TradingCalendar::new(source.load_trade_days()?)?;
        let universe = source.load_meta()?;
        info!(
            days = calendar.len(),
            securities = universe.len(),
            frequency = ?config.frequency,
            "pipeline ready"
        );
        Ok(Self {
            store: PanelStore::new(source),
            map: calendar.month_map(),
            calendar,
            universe,
            config,
            masked_turnover: None,
        })
    }

    /// Trading calendar.
    pub const fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    /// Configuration.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Panel store.
    pub const fn store(&self) -> &PanelStore<S> {
        &self.store
    }

    /// Consume the pipeline, returning the source.
    pub fn into_source(self) -> S {
        self.store.into_source()
    }

    /// Compute the snapshot for `anchor`.
    ///
    /// The snapshot is dated at the trading day `anchor` resolves to and holds
    /// the eligible securities listed on that day, with one column per target
    /// of the run.
    ///
    /// # Errors
    /// Returns `Calendar` if `anchor` precedes the calendar, `MissingColumn`
    /// if a target was not produced, and any error of a category that cannot
    /// fall back to missing values.
    pub fn assemble(&mut self, anchor: Date) -> Result<FactorSnapshot, PipelineError> {
        let frequency = self.config.frequency;
        let dates = AnchorDates::resolve(anchor, &self.calendar, &self.map, frequency)?;
        let entities = self.universe.at(dates.tdate);
        debug!(
            anchor = %anchor,
            tdate = %dates.tdate,
            value_date = %dates.value_date,
            report_month = %dates.report_month,
            entities = entities.len(),
            "assembling snapshot"
        );

        let mut ctx = Context {
            store: &mut self.store,
            masked_turnover: &mut self.masked_turnover,
            calendar: &self.calendar,
            config: &self.config,
            dates: &dates,
            entities: &entities,
        };
        let basics = basic::basic_rows(&mut ctx)?;

        let mut factors = FactorTable::new(entities.clone())?;
        for category in Category::ALL.into_iter().filter(|c| c.applies(frequency, dates.month_end)) {
            let table = categories::compute(category, &mut ctx)?;
            debug!(category = category.name(), columns = table.n_columns(), "computed category");
            factors = factors.outer_join(&table)?;
        }

        let targets = target_columns(frequency, dates.month_end);
        let factors = factors.select(&targets).map_err(|e| match e {
            PanelError::MissingColumn(name) => PipelineError::MissingColumn(name),
            other => PipelineError::Panel(other),
        })?;

        let keep = basic::eligible_mask(&basics, &self.config.eligibility);
        let factors = factors.retain(|i| keep[i]);
        let basics: Vec<_> =
            basics.into_iter().zip(&keep).filter(|(_, k)| **k).map(|(row, _)| row).collect();

        info!(
            date = %dates.tdate,
            rows = basics.len(),
            dropped = entities.len() - basics.len(),
            columns = factors.n_columns(),
            "assembled snapshot"
        );
        Ok(FactorSnapshot::new(dates.tdate, basics, factors)?)
    }

    /// Assemble and persist the snapshot for `anchor`, returning its date.
    ///
    /// # Errors
    /// Returns `SnapshotExists` without computing anything if the source
    /// already holds the snapshot, and any error of [`Self::assemble`] or of
    /// the write.
    pub fn run_date(&mut self, anchor: Date) -> Result<Date, PipelineError> {
        let tdate = self.calendar.resolve_date(anchor)?;
        if self.store.source().has_snapshot(tdate) {
            return Err(PipelineError::SnapshotExists(tdate));
        }
        let snapshot = self.assemble(anchor)?;
        self.store.source_mut().save_snapshot(&snapshot)?;
        Ok(tdate)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn calendar() -> TradingCalendar {
        TradingCalendar::new(vec![
            d(2020, 2, 27),
            d(2020, 2, 28),
            d(2020, 3, 2),
            d(2020, 3, 19),
            d(2020, 3, 20),
            d(2020, 3, 31),
            d(2020, 4, 1),
        ])
        .unwrap()
    }

    #[rstest]
    #[case(Frequency::Monthly, d(2020, 2, 28), d(2020, 2, 28), d(2020, 2, 29), d(2020, 2, 29), true)]
    #[case(Frequency::Monthly, d(2020, 3, 21), d(2020, 3, 20), d(2020, 2, 29), d(2020, 2, 29), false)]
    #[case(Frequency::Monthly, d(2020, 3, 31), d(2020, 3, 31), d(2020, 3, 31), d(2020, 3, 31), true)]
    #[case(Frequency::Weekly, d(2020, 3, 19), d(2020, 3, 19), d(2020, 3, 19), d(2020, 2, 29), false)]
    #[case(Frequency::Weekly, d(2020, 2, 28), d(2020, 2, 28), d(2020, 2, 28), d(2020, 1, 31), true)]
    #[case(Frequency::Weekly, d(2020, 3, 31), d(2020, 3, 31), d(2020, 3, 31), d(2020, 3, 31), true)]
    fn anchor_dates(
        #[case] frequency: Frequency,
        #[case] anchor: Date,
        #[case] tdate: Date,
        #[case] value_date: Date,
        #[case] report_month: Date,
        #[case] month_end: bool,
    ) {
        let calendar = calendar();
        let dates = AnchorDates::resolve(anchor, &calendar, &calendar.month_map(), frequency).unwrap();
        assert_eq!(dates, AnchorDates { tdate, value_date, report_month, month_end });
    }

    #[test]
    fn anchor_before_calendar_is_fatal() {
        let calendar = calendar();
        let err = AnchorDates::resolve(d(2019, 1, 1), &calendar, &calendar.month_map(), Frequency::Monthly)
            .unwrap_err();
        assert!(!err.is_recoverable());
    }
}
