//! In-memory panel source.

use std::collections::{BTreeMap, HashMap};

use tessera_primitives::{Date, DatePanel, FactorSnapshot, LabelPanel, Panel, Universe};
use tessera_traits::{PanelSource, SourceError};

/// Panel source backed by hash maps.
///
/// Used by tests and by callers that assemble panels themselves.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    panels: HashMap<String, Panel>,
    labels: HashMap<String, LabelPanel>,
    dates: HashMap<String, DatePanel>,
    snapshots: BTreeMap<Date, FactorSnapshot>,
    meta: Option<Universe>,
    trade_days: Option<Vec<Date>>,
}

impl MemorySource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a numeric panel.
    pub fn insert(&mut self, name: impl Into<String>, panel: Panel) {
        self.panels.insert(name.into(), panel);
    }

    /// Store a label panel.
    pub fn insert_labels(&mut self, name: impl Into<String>, panel: LabelPanel) {
        self.labels.insert(name.into(), panel);
    }

    /// Store a report-date panel.
    pub fn insert_dates(&mut self, name: impl Into<String>, panel: DatePanel) {
        self.dates.insert(name.into(), panel);
    }

    /// Builder form of [`Self::insert`].
    #[must_use]
    pub fn with_panel(mut self, name: impl Into<String>, panel: Panel) -> Self {
        self.insert(name, panel);
        self
    }

    /// Builder form of [`Self::insert_labels`].
    #[must_use]
    pub fn with_labels(mut self, name: impl Into<String>, panel: LabelPanel) -> Self {
        self.insert_labels(name, panel);
        self
    }

    /// Builder form of [`Self::insert_dates`].
    #[must_use]
    pub fn with_dates(mut self, name: impl Into<String>, panel: DatePanel) -> Self {
        self.insert_dates(name, panel);
        self
    }

    /// Set listing metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: Universe) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Set the trading calendar.
    #[must_use]
    pub fn with_trade_days(mut self, days: Vec<Date>) -> Self {
        self.trade_days = Some(days);
        self
    }
}

fn lookup<T: Clone>(map: &HashMap<String, T>, name: &str) -> Result<T, SourceError> {
    map.get(name).cloned().ok_or_else(|| SourceError::NotFound(name.to_string()))
}

impl PanelSource for MemorySource {
    fn load(&self, name: &str) -> Result<Panel, SourceError> {
        lookup(&self.panels, name)
    }

    fn load_labels(&self, name: &str) -> Result<LabelPanel, SourceError> {
        lookup(&self.labels, name)
    }

    fn load_dates(&self, name: &str) -> Result<DatePanel, SourceError> {
        lookup(&self.dates, name)
    }

    fn save(&mut self, name: &str, panel: &Panel) -> Result<(), SourceError> {
        self.panels.insert(name.to_string(), panel.clone());
        Ok(())
    }

    fn save_snapshot(&mut self, snapshot: &FactorSnapshot) -> Result<(), SourceError> {
        self.snapshots.insert(snapshot.date, snapshot.clone());
        Ok(())
    }

    fn load_snapshot(&self, date: Date) -> Result<FactorSnapshot, SourceError> {
        self.snapshots.get(&date).cloned().ok_or_else(|| SourceError::NotFound(date.to_string()))
    }

    fn has_snapshot(&self, date: Date) -> bool {
        self.snapshots.contains_key(&date)
    }

    fn load_meta(&self) -> Result<Universe, SourceError> {
        self.meta.clone().ok_or_else(|| SourceError::NotFound("meta".to_string()))
    }

    fn load_trade_days(&self) -> Result<Vec<Date>, SourceError> {
        self.trade_days.clone().ok_or_else(|| SourceError::NotFound("trade_days".to_string()))
    }

    fn save_trade_days(&mut self, days: &[Date]) -> Result<(), SourceError> {
        self.trade_days = Some(days.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn missing_objects_are_not_found() {
        let source = MemorySource::new();
        assert!(source.load("close").unwrap_err().is_not_found());
        assert!(source.load_meta().unwrap_err().is_not_found());
        assert!(!source.has_snapshot(d(2020, 1, 31)));
    }

    #[test]
    fn save_replaces_whole_panel() {
        let mut source = MemorySource::new();
        let first = Panel::from_rows(vec![d(2020, 1, 2)], vec![("A".into(), vec![1.0])]).unwrap();
        let second = Panel::from_rows(
            vec![d(2020, 1, 2), d(2020, 1, 3)],
            vec![("B".into(), vec![2.0, 3.0])],
        )
        .unwrap();
        source.save("close", &first).unwrap();
        source.save("close", &second).unwrap();

        let loaded = source.load("close").unwrap();
        assert_eq!(loaded.n_dates(), 2);
        assert!(loaded.entity_position(&"A".into()).is_none());
    }
}
