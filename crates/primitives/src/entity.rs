//! Entity and universe type definitions.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::Date;

/// Security code identifying one row of a panel (e.g. `600000.SH`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    /// Create a new entity id.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Listing metadata for one security.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityMeta {
    /// Security code.
    pub code: EntityId,
    /// Short name at listing time.
    pub name: String,
    /// First listing date.
    pub list_date: Date,
    /// Delisting date, if the security has been delisted.
    pub delist_date: Option<Date>,
}

impl SecurityMeta {
    /// Create listing metadata.
    #[must_use]
    pub fn new(
        code: impl Into<EntityId>,
        name: impl Into<String>,
        list_date: Date,
        delist_date: Option<Date>,
    ) -> Self {
        Self { code: code.into(), name: name.into(), list_date, delist_date }
    }

    /// Whether the security is tradable on `date`.
    ///
    /// A security delisted on `date` itself still counts as valid.
    #[must_use]
    pub fn is_valid_at(&self, date: Date) -> bool {
        self.list_date <= date && self.delist_date.is_none_or(|d| d >= date)
    }
}

/// The full set of known securities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Universe {
    securities: Vec<SecurityMeta>,
}

impl Universe {
    /// Create a universe from listing metadata.
    #[must_use]
    pub const fn new(securities: Vec<SecurityMeta>) -> Self {
        Self { securities }
    }

    /// Codes of the securities valid at `date`, in metadata order.
    #[must_use]
    pub fn at(&self, date: Date) -> Vec<EntityId> {
        self.securities.iter().filter(|s| s.is_valid_at(date)).map(|s| s.code.clone()).collect()
    }

    /// Look up metadata by code.
    #[must_use]
    pub fn get(&self, code: &EntityId) -> Option<&SecurityMeta> {
        self.securities.iter().find(|s| &s.code == code)
    }

    /// All securities.
    #[must_use]
    pub fn securities(&self) -> &[SecurityMeta] {
        &self.securities
    }

    /// Number of known securities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.securities.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.securities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn entity_from_str() {
        let id: EntityId = "000001.SZ".into();
        assert_eq!(id.as_str(), "000001.SZ");
        assert_eq!(id.to_string(), "000001.SZ");
    }

    #[test]
    fn validity_window() {
        let listed = SecurityMeta::new("A", "Alpha", d(2010, 1, 4), None);
        assert!(!listed.is_valid_at(d(2010, 1, 1)));
        assert!(listed.is_valid_at(d(2010, 1, 4)));

        let delisted = SecurityMeta::new("B", "Beta", d(2010, 1, 4), Some(d(2015, 6, 30)));
        assert!(delisted.is_valid_at(d(2015, 6, 30)));
        assert!(!delisted.is_valid_at(d(2015, 7, 1)));
    }

    #[test]
    fn universe_at_date() {
        let universe = Universe::new(vec![
            SecurityMeta::new("A", "Alpha", d(2010, 1, 4), None),
            SecurityMeta::new("B", "Beta", d(2012, 1, 4), None),
            SecurityMeta::new("C", "Gamma", d(2008, 1, 4), Some(d(2011, 1, 4))),
        ]);

        let codes = universe.at(d(2011, 6, 1));
        assert_eq!(codes, vec![EntityId::from("A")]);
        assert_eq!(universe.at(d(2013, 1, 1)).len(), 2);
        assert_eq!(universe.get(&"B".into()).map(|s| s.name.as_str()), Some("Beta"));
    }
}
