//! Directory-of-CSV panel source.

use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use polars::prelude::*;
use tessera_primitives::{
    Date, DatePanel, EntityId, FactorSnapshot, LabelPanel, Panel, SecurityMeta, Universe,
};
use tessera_traits::{PanelSource, SourceError};
use tracing::debug;

use crate::{
    IndicatorCategory, IndicatorRegistry, dates_from_frame, labels_from_frame, panel_from_frame,
    panel_to_frame, snapshot_from_frame, snapshot_to_frame,
};

const FACTOR_DIR: &str = "factors";
const META_FILE: &str = "meta.csv";
const TRADE_DAYS_FILE: &str = "trade_days.csv";

/// Panel source over a directory of wide CSV files.
///
/// ```text
/// root/
///   daily/<name>.csv       code, <trading day>...
///   monthly/<name>.csv     code, <calendar month end>...
///   quarterly/<name>.csv   code, <report date>...
///   factors/<date>.csv     one snapshot per anchor date
///   meta.csv               code, name, list_date, delist_date
///   trade_days.csv         date
/// ```
///
/// Every cell is read as text and converted per panel kind, so report-date
/// placeholders such as `0` load as missing instead of failing the read.
#[derive(Debug, Clone)]
pub struct CsvSource {
    root: PathBuf,
    registry: IndicatorRegistry,
}

impl CsvSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, registry: IndicatorRegistry) -> Self {
        Self { root: root.into(), registry }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Indicator registry used to place panels.
    #[must_use]
    pub const fn registry(&self) -> &IndicatorRegistry {
        &self.registry
    }

    fn panel_path(&self, category: IndicatorCategory, name: &str) -> PathBuf {
        self.root.join(category.dir_name()).join(format!("{name}.csv"))
    }

    fn snapshot_path(&self, date: Date) -> PathBuf {
        self.root.join(FACTOR_DIR).join(format!("{}.csv", date.format("%Y-%m-%d")))
    }

    /// Existing file for `name`: the registered category, or the first
    /// category in search order holding a file of that name.
    fn locate(&self, name: &str) -> Result<PathBuf, SourceError> {
        let candidates: Vec<PathBuf> = match self.registry.category(name) {
            Some(category) => vec![self.panel_path(category, name)],
            None => IndicatorCategory::SEARCH_ORDER
                .iter()
                .map(|c| self.panel_path(*c, name))
                .collect(),
        };
        candidates
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| SourceError::NotFound(name.to_string()))
    }

    fn read(&self, path: &Path) -> Result<DataFrame, SourceError> {
        debug!(path = %path.display(), "reading csv");
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;
        Ok(df)
    }

    fn write(&self, path: &Path, mut df: DataFrame) -> Result<(), SourceError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
        debug!(path = %path.display(), rows = df.height(), "wrote csv");
        Ok(())
    }

    fn read_existing(&self, path: &Path, what: &str) -> Result<DataFrame, SourceError> {
        if !path.is_file() {
            return Err(SourceError::NotFound(what.to_string()));
        }
        self.read(path)
    }
}

fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, SourceError> {
    let column = df
        .column(name)
        .map_err(|_| SourceError::Format(format!("missing column {name}")))?;
    Ok(column
        .as_materialized_series()
        .cast(&DataType::String)?
        .str()?
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
        .collect())
}

fn parse_date(value: Option<&str>, what: &str) -> Result<Option<Date>, SourceError> {
    value
        .map(|s| {
            Date::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| SourceError::Format(format!("{what}: {s}: {e}")))
        })
        .transpose()
}

impl PanelSource for CsvSource {
    fn load(&self, name: &str) -> Result<Panel, SourceError> {
        panel_from_frame(&self.read(&self.locate(name)?)?)
    }

    fn load_labels(&self, name: &str) -> Result<LabelPanel, SourceError> {
        labels_from_frame(&self.read(&self.locate(name)?)?)
    }

    fn load_dates(&self, name: &str) -> Result<DatePanel, SourceError> {
        dates_from_frame(&self.read(&self.locate(name)?)?)
    }

    fn save(&mut self, name: &str, panel: &Panel) -> Result<(), SourceError> {
        let category = self
            .registry
            .category(name)
            .ok_or_else(|| SourceError::Unregistered(name.to_string()))?;
        self.write(&self.panel_path(category, name), panel_to_frame(panel)?)
    }

    fn save_snapshot(&mut self, snapshot: &FactorSnapshot) -> Result<(), SourceError> {
        self.write(&self.snapshot_path(snapshot.date), snapshot_to_frame(snapshot)?)
    }

    fn load_snapshot(&self, date: Date) -> Result<FactorSnapshot, SourceError> {
        let df = self.read_existing(&self.snapshot_path(date), &date.to_string())?;
        snapshot_from_frame(date, &df)
    }

    fn has_snapshot(&self, date: Date) -> bool {
        self.snapshot_path(date).is_file()
    }

    fn load_meta(&self) -> Result<Universe, SourceError> {
        let df = self.read_existing(&self.root.join(META_FILE), "meta")?;
        let codes = text_column(&df, "code")?;
        let names = text_column(&df, "name")?;
        let listed = text_column(&df, "list_date")?;
        let delisted = text_column(&df, "delist_date")?;

        let mut securities = Vec::with_capacity(codes.len());
        for (i, code) in codes.into_iter().enumerate() {
            let Some(code) = code else {
                return Err(SourceError::Format(format!("meta row {i} has no code")));
            };
            let list_date = parse_date(listed[i].as_deref(), "list_date")?
                .ok_or_else(|| SourceError::Format(format!("{code} has no list_date")))?;
            let delist_date = parse_date(delisted[i].as_deref(), "delist_date")?;
            securities.push(SecurityMeta::new(
                EntityId::from(code),
                names[i].clone().unwrap_or_default(),
                list_date,
                delist_date,
            ));
        }
        Ok(Universe::new(securities))
    }

    fn load_trade_days(&self) -> Result<Vec<Date>, SourceError> {
        let df = self.read_existing(&self.root.join(TRADE_DAYS_FILE), "trade_days")?;
        text_column(&df, "date")?
            .into_iter()
            .flatten()
            .map(|s| {
                Date::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|e| SourceError::Format(format!("trade day: {s}: {e}")))
            })
            .collect()
    }

    fn save_trade_days(&mut self, days: &[Date]) -> Result<(), SourceError> {
        let strings: Vec<String> = days.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect();
        let df = DataFrame::new(vec![Column::new("date".into(), strings)])?;
        self.write(&self.root.join(TRADE_DAYS_FILE), df)
    }
}
