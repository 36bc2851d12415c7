//! Indicator name to storage category mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Storage category of an indicator panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorCategory {
    /// Keyed by trading day.
    Daily,
    /// Keyed by calendar month end.
    Monthly,
    /// Keyed by fiscal report date.
    Quarterly,
    /// Reference data outside the date-keyed layout.
    Meta,
}

impl IndicatorCategory {
    /// Sub-directory a file-backed source stores this category under.
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Meta => "meta",
        }
    }

    /// Categories searched, in order, when reading an unregistered name.
    pub const SEARCH_ORDER: [Self; 3] = [Self::Daily, Self::Monthly, Self::Quarterly];
}

/// Explicit mapping from indicator name to [`IndicatorCategory`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorRegistry {
    categories: BTreeMap<String, IndicatorCategory>,
}

impl IndicatorRegistry {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self { categories: BTreeMap::new() }
    }

    /// Register `name`, returning the previous category if any.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        category: IndicatorCategory,
    ) -> Option<IndicatorCategory> {
        self.categories.insert(name.into(), category)
    }

    /// Register every name in `names` under `category`.
    #[must_use]
    pub fn with_all<'a>(
        mut self,
        category: IndicatorCategory,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        for name in names {
            self.register(name, category);
        }
        self
    }

    /// Merge `other` into `self`; entries in `other` win.
    pub fn extend(&mut self, other: &Self) {
        self.categories.extend(other.categories.iter().map(|(k, v)| (k.clone(), *v)));
    }

    /// Category of `name`.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<IndicatorCategory> {
        self.categories.get(name).copied()
    }

    /// Number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Registered names with their categories.
    pub fn iter(&self) -> impl Iterator<Item = (&str, IndicatorCategory)> {
        self.categories.iter().map(|(k, v)| (k.as_str(), *v))
    }
}
