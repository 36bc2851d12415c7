//! Factor tables and per-date snapshots.

use std::collections::HashMap;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{Date, EntityId, PanelError};

/// Name of a factor column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
pub struct FactorName(pub String);

impl FactorName {
    /// Create a new factor name.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the factor name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FactorName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FactorName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Entities by named factor columns for one date.
///
/// Column order is insertion order. Missing values are `NaN`.
#[derive(Debug, Clone, Default)]
pub struct FactorTable {
    entities: Vec<EntityId>,
    index: HashMap<EntityId, usize>,
    columns: Vec<(FactorName, Vec<f64>)>,
}

impl FactorTable {
    /// Create an empty table over `entities`.
    ///
    /// # Errors
    /// Returns `DuplicateEntity` if an entity repeats.
    pub fn new(entities: Vec<EntityId>) -> Result<Self, PanelError> {
        let mut index = HashMap::with_capacity(entities.len());
        for (i, e) in entities.iter().enumerate() {
            if index.insert(e.clone(), i).is_some() {
                return Err(PanelError::DuplicateEntity(e.to_string()));
            }
        }
        Ok(Self { entities, index, columns: Vec::new() })
    }

    /// Row entities.
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Column names in order.
    pub fn names(&self) -> impl Iterator<Item = &FactorName> {
        self.columns.iter().map(|(n, _)| n)
    }

    /// Columns in order.
    #[must_use]
    pub fn columns(&self) -> &[(FactorName, Vec<f64>)] {
        &self.columns
    }

    /// Number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.entities.len()
    }

    /// Number of columns.
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Whether a column exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|(n, _)| n.as_str() == name)
    }

    /// Add a column.
    ///
    /// # Errors
    /// Returns an error if the length differs from the row count or the
    /// name already exists.
    pub fn insert_column(
        &mut self,
        name: impl Into<FactorName>,
        values: Vec<f64>,
    ) -> Result<(), PanelError> {
        let name = name.into();
        if values.len() != self.entities.len() {
            return Err(PanelError::LengthMismatch {
                expected: self.entities.len(),
                actual: values.len(),
            });
        }
        if self.contains(name.as_str()) {
            return Err(PanelError::DuplicateColumn(name.0));
        }
        self.columns.push((name, values));
        Ok(())
    }

    /// Add an all-missing column.
    ///
    /// # Errors
    /// Returns `DuplicateColumn` if the name already exists.
    pub fn insert_missing(&mut self, name: impl Into<FactorName>) -> Result<(), PanelError> {
        let n = self.entities.len();
        self.insert_column(name, vec![f64::NAN; n])
    }

    /// Values of a column.
    ///
    /// # Errors
    /// Returns `MissingColumn` if absent.
    pub fn column(&self, name: &str) -> Result<&[f64], PanelError> {
        self.columns
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, v)| v.as_slice())
            .ok_or_else(|| PanelError::MissingColumn(name.to_string()))
    }

    /// Value at `(entity, column)`.
    ///
    /// # Errors
    /// Returns an error if the entity or the column is absent.
    pub fn value(&self, entity: &EntityId, name: &str) -> Result<f64, PanelError> {
        let i =
            self.index.get(entity).ok_or_else(|| PanelError::EntityNotFound(entity.to_string()))?;
        Ok(self.column(name)?[*i])
    }

    /// Outer join on entity.
    ///
    /// Rows keep `self`'s order followed by entities only in `other`.
    /// Cells without a source row are missing.
    ///
    /// # Errors
    /// Returns `DuplicateColumn` if both tables carry the same column.
    pub fn outer_join(&self, other: &Self) -> Result<Self, PanelError> {
        if let Some((name, _)) = other.columns.iter().find(|(n, _)| self.contains(n.as_str())) {
            return Err(PanelError::DuplicateColumn(name.0.clone()));
        }
        let mut entities = self.entities.clone();
        entities.extend(other.entities.iter().filter(|e| !self.index.contains_key(*e)).cloned());

        let mut joined = self.reindex(&entities)?;
        for (name, values) in &other.columns {
            let col = entities
                .iter()
                .map(|e| other.index.get(e).map_or(f64::NAN, |&i| values[i]))
                .collect();
            joined.columns.push((name.clone(), col));
        }
        Ok(joined)
    }

    /// Project onto `targets` in the order given.
    ///
    /// # Errors
    /// Returns `MissingColumn` for the first absent target.
    pub fn select(&self, targets: &[FactorName]) -> Result<Self, PanelError> {
        let columns = targets
            .iter()
            .map(|t| self.column(t.as_str()).map(|v| (t.clone(), v.to_vec())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entities: self.entities.clone(), index: self.index.clone(), columns })
    }

    /// Reorder rows to `entities`; unknown entities get missing values.
    ///
    /// # Errors
    /// Returns `DuplicateEntity` if `entities` repeats.
    pub fn reindex(&self, entities: &[EntityId]) -> Result<Self, PanelError> {
        let mut out = Self::new(entities.to_vec())?;
        out.columns = self
            .columns
            .iter()
            .map(|(name, values)| {
                let col = entities
                    .iter()
                    .map(|e| self.index.get(e).map_or(f64::NAN, |&i| values[i]))
                    .collect();
                (name.clone(), col)
            })
            .collect();
        Ok(out)
    }

    /// Keep the rows for which `keep(row_index)` holds.
    #[must_use]
    pub fn retain(&self, keep: impl Fn(usize) -> bool) -> Self {
        let rows: Vec<usize> = (0..self.entities.len()).filter(|&i| keep(i)).collect();
        let entities: Vec<EntityId> = rows.iter().map(|&i| self.entities[i].clone()).collect();
        let index = entities.iter().enumerate().map(|(i, e)| (e.clone(), i)).collect();
        let columns = self
            .columns
            .iter()
            .map(|(n, v)| (n.clone(), rows.iter().map(|&i| v[i]).collect()))
            .collect();
        Self { entities, index, columns }
    }
}

/// Identification columns carried next to the factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicRow {
    /// Security code.
    pub code: EntityId,
    /// Short name.
    pub name: Option<String>,
    /// Industry classification.
    pub industry: Option<String>,
    /// Float market capitalisation.
    pub mkt_cap_float: f64,
    /// Trading status over the next period, `None` when unknown.
    pub is_open: Option<bool>,
    /// Forward-period return.
    pub pct_chg_nm: f64,
}

/// Assembled output for one anchor date.
#[derive(Debug, Clone)]
pub struct FactorSnapshot {
    /// Anchor date.
    pub date: Date,
    /// Identification rows, aligned with `factors`.
    pub basics: Vec<BasicRow>,
    /// Factor columns.
    pub factors: FactorTable,
}

impl FactorSnapshot {
    /// Create a snapshot.
    ///
    /// # Errors
    /// Returns `LengthMismatch` if `basics` and `factors` differ in rows, or
    /// `EntityNotFound` if a basic row is out of order.
    pub fn new(date: Date, basics: Vec<BasicRow>, factors: FactorTable) -> Result<Self, PanelError> {
        if basics.len() != factors.n_rows() {
            return Err(PanelError::LengthMismatch {
                expected: factors.n_rows(),
                actual: basics.len(),
            });
        }
        if let Some(row) = basics.iter().zip(factors.entities()).find(|(b, e)| &b.code != *e) {
            return Err(PanelError::EntityNotFound(row.0.code.to_string()));
        }
        Ok(Self { date, basics, factors })
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.basics.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.basics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entities: &[&str], name: &str, values: Vec<f64>) -> FactorTable {
        let mut t = FactorTable::new(entities.iter().map(|&e| e.into()).collect()).unwrap();
        t.insert_column(name, values).unwrap();
        t
    }

    #[test]
    fn outer_join_fills_missing() {
        let left = table(&["A", "B"], "EP", vec![0.1, 0.2]);
        let right = table(&["B", "C"], "BP", vec![1.0, 2.0]);
        let joined = left.outer_join(&right).unwrap();

        assert_eq!(joined.entities(), &["A".into(), "B".into(), "C".into()]);
        assert!(joined.value(&"C".into(), "EP").unwrap().is_nan());
        assert!(joined.value(&"A".into(), "BP").unwrap().is_nan());
        assert_eq!(joined.value(&"B".into(), "BP").unwrap(), 1.0);
    }

    #[test]
    fn outer_join_rejects_duplicate_columns() {
        let left = table(&["A"], "EP", vec![0.1]);
        let right = table(&["A"], "EP", vec![0.2]);
        assert_eq!(
            left.outer_join(&right).unwrap_err(),
            PanelError::DuplicateColumn("EP".to_string())
        );
    }

    #[test]
    fn select_missing_target_fails() {
        let t = table(&["A"], "EP", vec![0.1]);
        let err = t.select(&["EP".into(), "BP".into()]).unwrap_err();
        assert_eq!(err, PanelError::MissingColumn("BP".to_string()));
    }

    #[test]
    fn select_orders_columns() {
        let mut t = table(&["A"], "EP", vec![0.1]);
        t.insert_column("BP", vec![0.5]).unwrap();
        let s = t.select(&["BP".into(), "EP".into()]).unwrap();
        let names: Vec<&str> = s.names().map(FactorName::as_str).collect();
        assert_eq!(names, vec!["BP", "EP"]);
    }

    #[test]
    fn insert_checks_length() {
        let mut t = FactorTable::new(vec!["A".into(), "B".into()]).unwrap();
        assert!(t.insert_column("EP", vec![1.0]).is_err());
        t.insert_missing("EP").unwrap();
        assert!(t.column("EP").unwrap().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn retain_rows() {
        let t = table(&["A", "B", "C"], "EP", vec![1.0, 2.0, 3.0]);
        let kept = t.retain(|i| i != 1);
        assert_eq!(kept.column("EP").unwrap(), &[1.0, 3.0]);
        assert_eq!(kept.value(&"C".into(), "EP").unwrap(), 3.0);
    }

    #[test]
    fn snapshot_requires_aligned_rows() {
        let t = table(&["A"], "EP", vec![0.1]);
        let row = BasicRow {
            code: "B".into(),
            name: Some("Beta".to_string()),
            industry: None,
            mkt_cap_float: 1.0,
            is_open: Some(true),
            pct_chg_nm: f64::NAN,
        };
        let date = Date::from_ymd_opt(2024, 1, 31).unwrap();
        assert!(FactorSnapshot::new(date, vec![row], t).is_err());
    }
}
