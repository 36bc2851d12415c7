//! Entity × date indicator panels.

use std::collections::HashMap;

use chrono::Datelike;
use ndarray::{Array2, ArrayView1, s};

use crate::{Date, EntityId, PanelError};

/// Cell values that carry their own "missing" marker.
pub trait Missing: Clone {
    /// The missing value.
    fn missing() -> Self;

    /// Whether this value is missing.
    fn is_missing(&self) -> bool;
}

impl Missing for f64 {
    fn missing() -> Self {
        Self::NAN
    }

    fn is_missing(&self) -> bool {
        self.is_nan()
    }
}

impl<T: Clone> Missing for Option<T> {
    fn missing() -> Self {
        None
    }

    fn is_missing(&self) -> bool {
        self.is_none()
    }
}

/// Panel of free-text labels (names, industry classifications).
pub type LabelPanel = Panel<Option<String>>;

/// Panel of dates (fiscal report dates).
pub type DatePanel = Panel<Option<Date>>;

/// A named indicator laid out as entities (rows) by dates (columns).
///
/// Rows are unique and columns are strictly increasing. Numeric panels use
/// `NaN` for missing cells. Lookups of an absent entity or date fail instead
/// of returning a placeholder.
#[derive(Debug, Clone)]
pub struct Panel<T = f64> {
    entities: Vec<EntityId>,
    dates: Vec<Date>,
    values: Array2<T>,
    index: HashMap<EntityId, usize>,
}

impl<T: Clone> Panel<T> {
    /// Create a panel from its axes and a `entities × dates` value matrix.
    ///
    /// # Errors
    /// Returns an error on duplicate entities, non-increasing dates or a
    /// shape that does not match the axes.
    pub fn new(
        entities: Vec<EntityId>,
        dates: Vec<Date>,
        values: Array2<T>,
    ) -> Result<Self, PanelError> {
        let expected = (entities.len(), dates.len());
        if values.dim() != expected {
            return Err(PanelError::ShapeMismatch { expected, actual: values.dim() });
        }
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(PanelError::UnsortedDates(w[1]));
        }

        let mut index = HashMap::with_capacity(entities.len());
        for (i, e) in entities.iter().enumerate() {
            if index.insert(e.clone(), i).is_some() {
                return Err(PanelError::DuplicateEntity(e.to_string()));
            }
        }

        Ok(Self { entities, dates, values, index })
    }

    /// Create a panel from per-entity rows.
    ///
    /// # Errors
    /// Returns an error if a row length differs from `dates.len()` or the
    /// axes are invalid.
    pub fn from_rows(
        dates: Vec<Date>,
        rows: Vec<(EntityId, Vec<T>)>,
    ) -> Result<Self, PanelError> {
        let n_dates = dates.len();
        let mut entities = Vec::with_capacity(rows.len());
        let mut flat = Vec::with_capacity(rows.len() * n_dates);
        for (entity, row) in rows {
            if row.len() != n_dates {
                return Err(PanelError::LengthMismatch { expected: n_dates, actual: row.len() });
            }
            entities.push(entity);
            flat.extend(row);
        }
        let values = Array2::from_shape_vec((entities.len(), n_dates), flat).map_err(|_| {
            PanelError::ShapeMismatch { expected: (entities.len(), n_dates), actual: (0, 0) }
        })?;
        Self::new(entities, dates, values)
    }

    /// Row entities.
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Column dates.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// The value matrix.
    #[must_use]
    pub const fn values(&self) -> &Array2<T> {
        &self.values
    }

    /// Number of entities.
    #[must_use]
    pub fn n_entities(&self) -> usize {
        self.entities.len()
    }

    /// Number of dates.
    #[must_use]
    pub fn n_dates(&self) -> usize {
        self.dates.len()
    }

    /// Check if the panel has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Row position of an entity.
    #[must_use]
    pub fn entity_position(&self, entity: &EntityId) -> Option<usize> {
        self.index.get(entity).copied()
    }

    /// Column position of a date.
    #[must_use]
    pub fn date_position(&self, date: Date) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    fn require_entity(&self, entity: &EntityId) -> Result<usize, PanelError> {
        self.entity_position(entity).ok_or_else(|| PanelError::EntityNotFound(entity.to_string()))
    }

    fn require_date(&self, date: Date) -> Result<usize, PanelError> {
        self.date_position(date).ok_or(PanelError::DateNotFound(date))
    }

    /// Value at `(entity, date)`.
    ///
    /// # Errors
    /// Returns an error if either key is absent.
    pub fn get(&self, entity: &EntityId, date: Date) -> Result<&T, PanelError> {
        let i = self.require_entity(entity)?;
        let j = self.require_date(date)?;
        Ok(&self.values[[i, j]])
    }

    /// Overwrite the value at `(entity, date)`.
    ///
    /// # Errors
    /// Returns an error if either key is absent.
    pub fn set(&mut self, entity: &EntityId, date: Date, value: T) -> Result<(), PanelError> {
        let i = self.require_entity(entity)?;
        let j = self.require_date(date)?;
        self.values[[i, j]] = value;
        Ok(())
    }

    /// Full history of one entity.
    ///
    /// # Errors
    /// Returns an error if the entity is absent.
    pub fn row(&self, entity: &EntityId) -> Result<ArrayView1<'_, T>, PanelError> {
        let i = self.require_entity(entity)?;
        Ok(self.values.row(i))
    }

    /// All entities on one date.
    ///
    /// # Errors
    /// Returns an error if the date is absent.
    pub fn column(&self, date: Date) -> Result<ArrayView1<'_, T>, PanelError> {
        let j = self.require_date(date)?;
        Ok(self.values.column(j))
    }

    /// Values of `entities` on `date`, in the order given.
    ///
    /// # Errors
    /// Returns an error if the date or any entity is absent.
    pub fn cross_section(&self, entities: &[EntityId], date: Date) -> Result<Vec<T>, PanelError> {
        let j = self.require_date(date)?;
        entities
            .iter()
            .map(|e| self.require_entity(e).map(|i| self.values[[i, j]].clone()))
            .collect()
    }

    /// Sub-panel restricted to `entities` and `dates`, in the order given.
    ///
    /// # Errors
    /// Returns an error if any entity or date is absent.
    pub fn select(&self, entities: &[EntityId], dates: &[Date]) -> Result<Self, PanelError> {
        let rows = entities.iter().map(|e| self.require_entity(e)).collect::<Result<Vec<_>, _>>()?;
        let cols = dates.iter().map(|&d| self.require_date(d)).collect::<Result<Vec<_>, _>>()?;
        let values =
            Array2::from_shape_fn((rows.len(), cols.len()), |(i, j)| {
                self.values[[rows[i], cols[j]]].clone()
            });
        Self::new(entities.to_vec(), dates.to_vec(), values)
    }

    /// Apply `f` to every cell.
    #[must_use]
    pub fn map<U: Clone>(&self, f: impl Fn(&T) -> U) -> Panel<U> {
        Panel {
            entities: self.entities.clone(),
            dates: self.dates.clone(),
            values: self.values.map(f),
            index: self.index.clone(),
        }
    }

    /// Combine two panels with identical axes cell by cell.
    ///
    /// # Errors
    /// Returns `AxisMismatch` if entities or dates differ.
    pub fn zip_with<U: Clone, V: Clone>(
        &self,
        other: &Panel<U>,
        f: impl Fn(&T, &U) -> V,
    ) -> Result<Panel<V>, PanelError> {
        if self.entities != other.entities || self.dates != other.dates {
            return Err(PanelError::AxisMismatch);
        }
        let values = Array2::from_shape_fn(self.values.dim(), |(i, j)| {
            f(&self.values[[i, j]], &other.values[[i, j]])
        });
        Ok(Panel {
            entities: self.entities.clone(),
            dates: self.dates.clone(),
            values,
            index: self.index.clone(),
        })
    }

    /// Columns `anchor - n + 1 ..= anchor`, clamped at the first column.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if `anchor` is past the last column.
    pub fn trailing(&self, anchor: usize, n: usize) -> Result<Self, PanelError> {
        if anchor >= self.dates.len() {
            return Err(PanelError::ShapeMismatch {
                expected: (self.entities.len(), anchor + 1),
                actual: self.values.dim(),
            });
        }
        let start = (anchor + 1).saturating_sub(n);
        let values = self.values.slice(s![.., start..=anchor]).to_owned();
        Ok(Self {
            entities: self.entities.clone(),
            dates: self.dates[start..=anchor].to_vec(),
            values,
            index: self.index.clone(),
        })
    }

    /// Keep the last column of each period, relabelled to the period's
    /// calendar end.
    #[must_use]
    pub fn last_per_period(&self, period: Resample) -> Self {
        let mut cols: Vec<(Date, usize)> = Vec::new();
        for (j, d) in self.dates.iter().enumerate() {
            let label = period.label(*d);
            match cols.last_mut() {
                Some((last, pos)) if *last == label => *pos = j,
                _ => cols.push((label, j)),
            }
        }
        let values = Array2::from_shape_fn((self.entities.len(), cols.len()), |(i, k)| {
            self.values[[i, cols[k].1]].clone()
        });
        Self {
            entities: self.entities.clone(),
            dates: cols.into_iter().map(|(d, _)| d).collect(),
            values,
            index: self.index.clone(),
        }
    }

    /// Keep the last column of each calendar year, relabelled to December 31.
    #[must_use]
    pub fn last_per_year(&self) -> Self {
        self.last_per_period(Resample::Year)
    }
}

/// Resampling period for [`Panel::last_per_period`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resample {
    /// Calendar month.
    Month,
    /// Calendar quarter.
    Quarter,
    /// Calendar year.
    Year,
}

impl Resample {
    /// Calendar end of the period containing `date`.
    #[must_use]
    pub fn label(self, date: Date) -> Date {
        let end_month = match self {
            Self::Month => date.month(),
            Self::Quarter => date.month().div_ceil(3) * 3,
            Self::Year => 12,
        };
        let (y, m) = if end_month == 12 { (date.year() + 1, 1) } else { (date.year(), end_month + 1) };
        Date::from_ymd_opt(y, m, 1).and_then(|d| d.pred_opt()).unwrap_or(date)
    }
}

impl<T: Missing> Panel<T> {
    /// Like [`Panel::select`], but entities without a row get an all-missing
    /// row instead of failing.
    ///
    /// # Errors
    /// Returns `DateNotFound` if any date is absent.
    pub fn align(&self, entities: &[EntityId], dates: &[Date]) -> Result<Self, PanelError> {
        let cols = dates.iter().map(|&d| self.require_date(d)).collect::<Result<Vec<_>, _>>()?;
        let rows: Vec<Option<usize>> = entities.iter().map(|e| self.entity_position(e)).collect();
        let values = Array2::from_shape_fn((rows.len(), cols.len()), |(i, j)| {
            rows[i].map_or_else(T::missing, |r| self.values[[r, cols[j]]].clone())
        });
        Self::new(entities.to_vec(), dates.to_vec(), values)
    }

    /// Values of `entities` on `date`; unknown entities are missing.
    ///
    /// # Errors
    /// Returns `DateNotFound` if the date is absent.
    pub fn cross_section_or_missing(
        &self,
        entities: &[EntityId],
        date: Date,
    ) -> Result<Vec<T>, PanelError> {
        let j = self.require_date(date)?;
        Ok(entities
            .iter()
            .map(|e| self.entity_position(e).map_or_else(T::missing, |i| self.values[[i, j]].clone()))
            .collect())
    }
}

impl Panel<f64> {
    /// Element-wise ratio; zero or missing denominators give `NaN`.
    ///
    /// # Errors
    /// Returns `AxisMismatch` if the axes differ.
    pub fn ratio(&self, denominator: &Self) -> Result<Self, PanelError> {
        self.zip_with(denominator, |&n, &d| if d == 0.0 || d.is_nan() { f64::NAN } else { n / d })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample() -> Panel {
        Panel::from_rows(
            vec![d(2020, 1, 2), d(2020, 1, 3), d(2020, 1, 6)],
            vec![("A".into(), vec![1.0, 2.0, 3.0]), ("B".into(), vec![4.0, f64::NAN, 6.0])],
        )
        .unwrap()
    }

    #[test]
    fn lookup_existing_cell() {
        let p = sample();
        assert_eq!(*p.get(&"B".into(), d(2020, 1, 6)).unwrap(), 6.0);
        assert!(p.get(&"B".into(), d(2020, 1, 3)).unwrap().is_missing());
    }

    #[test]
    fn lookup_absent_keys_fail() {
        let p = sample();
        assert_eq!(
            p.get(&"C".into(), d(2020, 1, 2)).unwrap_err(),
            PanelError::EntityNotFound("C".to_string())
        );
        assert_eq!(
            p.get(&"A".into(), d(2020, 1, 4)).unwrap_err(),
            PanelError::DateNotFound(d(2020, 1, 4))
        );
    }

    #[test]
    fn rejects_invalid_axes() {
        let dup = Panel::from_rows(
            vec![d(2020, 1, 2)],
            vec![("A".into(), vec![1.0]), ("A".into(), vec![2.0])],
        );
        assert!(matches!(dup, Err(PanelError::DuplicateEntity(_))));

        let unsorted = Panel::from_rows(
            vec![d(2020, 1, 3), d(2020, 1, 2)],
            vec![("A".into(), vec![1.0, 2.0])],
        );
        assert!(matches!(unsorted, Err(PanelError::UnsortedDates(_))));
    }

    #[test]
    fn align_fills_unknown_entities() {
        let p = sample();
        let aligned = p.align(&["C".into(), "A".into()], &[d(2020, 1, 3)]).unwrap();
        assert!(aligned.values()[[0, 0]].is_nan());
        assert_eq!(aligned.values()[[1, 0]], 2.0);
        assert!(p.align(&["A".into()], &[d(2020, 1, 4)]).is_err());

        let xs = p.cross_section_or_missing(&["B".into(), "Z".into()], d(2020, 1, 6)).unwrap();
        assert_eq!(xs[0], 6.0);
        assert!(xs[1].is_nan());
    }

    #[test]
    fn select_reorders() {
        let p = sample();
        let sub = p.select(&["B".into(), "A".into()], &[d(2020, 1, 6)]).unwrap();
        assert_eq!(sub.values()[[0, 0]], 6.0);
        assert_eq!(sub.values()[[1, 0]], 3.0);
        assert!(p.select(&["Z".into()], &[d(2020, 1, 6)]).is_err());
    }

    #[test]
    fn cross_section_in_order() {
        let p = sample();
        let xs = p.cross_section(&["B".into(), "A".into()], d(2020, 1, 2)).unwrap();
        assert_eq!(xs, vec![4.0, 1.0]);
    }

    #[test]
    fn ratio_guards_denominator() {
        let num = sample();
        let den = num.map(|&v| if v == 1.0 { 0.0 } else { 2.0 });
        let r = num.ratio(&den).unwrap();
        assert!(r.values()[[0, 0]].is_nan());
        assert_eq!(r.values()[[0, 1]], 1.0);
        assert!(r.values()[[1, 1]].is_nan());
    }

    #[test]
    fn last_per_year_takes_final_column() {
        let p = Panel::from_rows(
            vec![d(2018, 6, 30), d(2018, 12, 31), d(2019, 3, 31), d(2019, 9, 30)],
            vec![("A".into(), vec![1.0, 2.0, 3.0, 4.0])],
        )
        .unwrap();
        let y = p.last_per_year();
        assert_eq!(y.dates(), &[d(2018, 12, 31), d(2019, 12, 31)]);
        assert_eq!(y.values()[[0, 0]], 2.0);
        assert_eq!(y.values()[[0, 1]], 4.0);
    }

    #[test]
    fn resample_labels() {
        assert_eq!(Resample::Month.label(d(2020, 2, 10)), d(2020, 2, 29));
        assert_eq!(Resample::Quarter.label(d(2020, 5, 1)), d(2020, 6, 30));
        assert_eq!(Resample::Quarter.label(d(2020, 11, 1)), d(2020, 12, 31));
        assert_eq!(Resample::Year.label(d(2021, 3, 1)), d(2021, 12, 31));
    }

    #[test]
    fn trailing_clamps_at_start() {
        let p = sample();
        let t = p.trailing(1, 5).unwrap();
        assert_eq!(t.dates(), &[d(2020, 1, 2), d(2020, 1, 3)]);
        let t = p.trailing(2, 2).unwrap();
        assert_eq!(t.values()[[1, 1]], 6.0);
        assert!(p.trailing(3, 1).is_err());
    }
}
