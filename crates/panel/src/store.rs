//! Caching panel store.

use std::{collections::HashMap, sync::Arc};

use tessera_primitives::{DatePanel, LabelPanel, Panel};
use tessera_traits::PanelSource;
use tracing::debug;

use crate::StoreError;

/// Single-owner cache in front of a [`PanelSource`].
///
/// Panels are loaded whole on first access and shared as [`Arc`]s afterwards.
/// Writes go straight to the source and drop the cached copy so the next read
/// sees what was persisted.
#[derive(Debug)]
pub struct PanelStore<S> {
    source: S,
    panels: HashMap<String, Arc<Panel>>,
    labels: HashMap<String, Arc<LabelPanel>>,
    dates: HashMap<String, Arc<DatePanel>>,
}

impl<S: PanelSource> PanelStore<S> {
    /// Create an empty store over `source`.
    pub fn new(source: S) -> Self {
        Self { source, panels: HashMap::new(), labels: HashMap::new(), dates: HashMap::new() }
    }

    /// Numeric panel `name`, loading it on first access.
    ///
    /// # Errors
    /// Returns `NotFound` if the source has no such panel.
    pub fn get_panel(&mut self, name: &str) -> Result<Arc<Panel>, StoreError> {
        if let Some(panel) = self.panels.get(name) {
            return Ok(Arc::clone(panel));
        }
        let panel = Arc::new(self.source.load(name)?);
        debug!(name, entities = panel.n_entities(), dates = panel.n_dates(), "loaded panel");
        self.panels.insert(name.to_string(), Arc::clone(&panel));
        Ok(panel)
    }

    /// Like [`Self::get_panel`] but maps `NotFound` to `None`.
    ///
    /// # Errors
    /// Returns any error other than `NotFound`.
    pub fn try_panel(&mut self, name: &str) -> Result<Option<Arc<Panel>>, StoreError> {
        match self.get_panel(name) {
            Ok(panel) => Ok(Some(panel)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Label panel `name`, loading it on first access.
    ///
    /// # Errors
    /// Returns `NotFound` if the source has no such panel.
    pub fn get_labels(&mut self, name: &str) -> Result<Arc<LabelPanel>, StoreError> {
        if let Some(panel) = self.labels.get(name) {
            return Ok(Arc::clone(panel));
        }
        let panel = Arc::new(self.source.load_labels(name)?);
        debug!(name, entities = panel.n_entities(), "loaded label panel");
        self.labels.insert(name.to_string(), Arc::clone(&panel));
        Ok(panel)
    }

    /// Report-date panel `name`, loading it on first access.
    ///
    /// # Errors
    /// Returns `NotFound` if the source has no such panel.
    pub fn get_dates(&mut self, name: &str) -> Result<Arc<DatePanel>, StoreError> {
        if let Some(panel) = self.dates.get(name) {
            return Ok(Arc::clone(panel));
        }
        let panel = Arc::new(self.source.load_dates(name)?);
        debug!(name, entities = panel.n_entities(), "loaded date panel");
        self.dates.insert(name.to_string(), Arc::clone(&panel));
        Ok(panel)
    }

    /// Persist `panel` under `name`, replacing the stored version.
    ///
    /// # Errors
    /// Returns the source error if the write fails; the cache is untouched.
    pub fn put_panel(&mut self, name: &str, panel: &Panel) -> Result<(), StoreError> {
        self.source.save(name, panel)?;
        self.invalidate(name);
        debug!(name, "persisted panel");
        Ok(())
    }

    /// Stored panel `name`, or the result of `derive` when none is stored.
    ///
    /// A derived panel is cached for the lifetime of the store but never
    /// persisted.
    ///
    /// # Errors
    /// Returns non-`NotFound` load errors and any error from `derive`.
    pub fn get_or_derive(
        &mut self,
        name: &str,
        derive: impl FnOnce(&mut Self) -> Result<Panel, StoreError>,
    ) -> Result<Arc<Panel>, StoreError> {
        if let Some(panel) = self.try_panel(name)? {
            return Ok(panel);
        }
        let panel = Arc::new(derive(self)?);
        debug!(name, "derived panel");
        self.panels.insert(name.to_string(), Arc::clone(&panel));
        Ok(panel)
    }

    /// Drop any cached copy of `name`.
    pub fn invalidate(&mut self, name: &str) {
        self.panels.remove(name);
        self.labels.remove(name);
        self.dates.remove(name);
    }

    /// Whether any panel kind named `name` is cached.
    #[must_use]
    pub fn is_cached(&self, name: &str) -> bool {
        self.panels.contains_key(name)
            || self.labels.contains_key(name)
            || self.dates.contains_key(name)
    }

    /// The underlying source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// The underlying source, mutably. Writes made here bypass invalidation.
    pub const fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the store, returning the source.
    pub fn into_source(self) -> S {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use tessera_primitives::Date;

    use super::*;
    use crate::MemorySource;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn panel(v: f64) -> Panel {
        Panel::from_rows(vec![d(2020, 1, 2)], vec![("A".into(), vec![v])]).unwrap()
    }

    #[test]
    fn reads_are_cached() {
        let source = MemorySource::new().with_panel("close", panel(1.0));
        let mut store = PanelStore::new(source);
        assert!(!store.is_cached("close"));
        assert_eq!(store.get_panel("close").unwrap().values()[[0, 0]], 1.0);
        assert!(store.is_cached("close"));

        // Changing the source behind the store's back is not observed.
        store.source_mut().insert("close", panel(2.0));
        assert_eq!(store.get_panel("close").unwrap().values()[[0, 0]], 1.0);
    }

    #[test]
    fn put_invalidates() {
        let source = MemorySource::new().with_panel("close", panel(1.0));
        let mut store = PanelStore::new(source);
        store.get_panel("close").unwrap();
        store.put_panel("close", &panel(3.0)).unwrap();
        assert!(!store.is_cached("close"));
        assert_eq!(store.get_panel("close").unwrap().values()[[0, 0]], 3.0);
    }

    #[test]
    fn missing_panel() {
        let mut store = PanelStore::new(MemorySource::new());
        assert!(store.get_panel("turn").unwrap_err().is_not_found());
        assert!(store.try_panel("turn").unwrap().is_none());
    }

    #[test]
    fn derive_only_when_absent() {
        let source = MemorySource::new().with_panel("close", panel(2.0));
        let mut store = PanelStore::new(source);

        let derived = store
            .get_or_derive("hfq_close", |s| {
                let close = s.get_panel("close")?;
                Ok(close.map(|v| v * 10.0))
            })
            .unwrap();
        assert_eq!(derived.values()[[0, 0]], 20.0);
        assert!(store.is_cached("hfq_close"));
        assert!(store.source().load("hfq_close").is_err());

        let stored = store.get_or_derive("close", |_| unreachable!()).unwrap();
        assert_eq!(stored.values()[[0, 0]], 2.0);
    }
}
