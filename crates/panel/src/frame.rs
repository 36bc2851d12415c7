//! Conversions between panels, snapshots and polars `DataFrame`s.
//!
//! Panels use a wide layout: a `code` column of entity ids followed by one
//! column per date named `YYYY-MM-DD`. Snapshots use one row per entity with
//! the identification columns first and the factor columns after them.

use polars::prelude::*;
use tessera_primitives::{
    BasicRow, Date, DatePanel, EntityId, FactorSnapshot, FactorTable, LabelPanel, Missing, Panel,
};
use tessera_traits::SourceError;

const CODE: &str = "code";
const DATE_FORMAT: &str = "%Y-%m-%d";
const BASIC_COLUMNS: [&str; 6] = [CODE, "name", "industry", "mkt_cap_float", "is_open", "pct_chg_nm"];

fn parse_date(s: &str) -> Option<Date> {
    Date::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

fn float_values(series: &Series) -> Result<Vec<f64>, SourceError> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

fn string_values(series: &Series) -> Result<Vec<Option<String>>, SourceError> {
    let cast = series.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
        .collect())
}

fn date_values(series: &Series) -> Result<Vec<Option<Date>>, SourceError> {
    Ok(string_values(series)?.into_iter().map(|v| v.as_deref().and_then(parse_date)).collect())
}

fn entity_column(df: &DataFrame) -> Result<Vec<EntityId>, SourceError> {
    let codes = string_values(df.column(CODE)?.as_materialized_series())?;
    codes
        .into_iter()
        .enumerate()
        .map(|(i, c)| c.map(EntityId::from).ok_or_else(|| SourceError::Format(format!("row {i} has no code"))))
        .collect()
}

fn wide_from_frame<T: Missing>(
    df: &DataFrame,
    read: impl Fn(&Series) -> Result<Vec<T>, SourceError>,
) -> Result<Panel<T>, SourceError> {
    let entities = entity_column(df)?;
    let mut dates = Vec::new();
    let mut columns = Vec::new();
    for column in df.get_columns().iter().filter(|c| c.name().as_str() != CODE) {
        let name = column.name().as_str();
        let date = parse_date(name)
            .ok_or_else(|| SourceError::Format(format!("column {name} is not a date")))?;
        dates.push(date);
        columns.push(read(column.as_materialized_series())?);
    }

    let rows = entities
        .into_iter()
        .enumerate()
        .map(|(i, e)| (e, columns.iter().map(|c| c[i].clone()).collect()))
        .collect();
    Ok(Panel::from_rows(dates, rows)?)
}

fn wide_to_frame<T: Clone>(
    panel: &Panel<T>,
    to_column: impl Fn(PlSmallStr, Vec<T>) -> Column,
) -> PolarsResult<DataFrame> {
    let mut columns = Vec::with_capacity(panel.n_dates() + 1);
    columns.push(Column::new(
        CODE.into(),
        panel.entities().iter().map(EntityId::as_str).collect::<Vec<_>>(),
    ));
    for (j, date) in panel.dates().iter().enumerate() {
        let values = panel.values().column(j).to_vec();
        columns.push(to_column(date.format(DATE_FORMAT).to_string().into(), values));
    }
    DataFrame::new(columns)
}

fn float_column(name: PlSmallStr, values: &[f64]) -> Column {
    Column::new(name, values.iter().map(|v| (!v.is_nan()).then_some(*v)).collect::<Vec<_>>())
}

/// Numeric panel to wide frame; missing cells become nulls.
///
/// # Errors
/// Returns a polars error if the frame cannot be built.
pub fn panel_to_frame(panel: &Panel) -> PolarsResult<DataFrame> {
    wide_to_frame(panel, |name, values| float_column(name, &values))
}

/// Label panel to wide frame.
///
/// # Errors
/// Returns a polars error if the frame cannot be built.
pub fn labels_to_frame(panel: &LabelPanel) -> PolarsResult<DataFrame> {
    wide_to_frame(panel, |name, values: Vec<Option<String>>| Column::new(name, values))
}

/// Report-date panel to wide frame of `YYYY-MM-DD` strings.
///
/// # Errors
/// Returns a polars error if the frame cannot be built.
pub fn dates_to_frame(panel: &DatePanel) -> PolarsResult<DataFrame> {
    wide_to_frame(panel, |name, values| {
        let strings: Vec<Option<String>> =
            values.iter().map(|d| d.map(|d| d.format(DATE_FORMAT).to_string())).collect();
        Column::new(name, strings)
    })
}

/// Wide frame to numeric panel. Nulls and unparseable cells become `NaN`.
///
/// # Errors
/// Returns `Format` if the `code` column or a date header is invalid.
pub fn panel_from_frame(df: &DataFrame) -> Result<Panel, SourceError> {
    wide_from_frame(df, float_values)
}

/// Wide frame to label panel. Empty strings become missing.
///
/// # Errors
/// Returns `Format` if the `code` column or a date header is invalid.
pub fn labels_from_frame(df: &DataFrame) -> Result<LabelPanel, SourceError> {
    wide_from_frame(df, string_values)
}

/// Wide frame to report-date panel. Unparseable cells, including the `0`
/// placeholder, become missing.
///
/// # Errors
/// Returns `Format` if the `code` column or a date header is invalid.
pub fn dates_from_frame(df: &DataFrame) -> Result<DatePanel, SourceError> {
    wide_from_frame(df, date_values)
}

/// Snapshot to a frame with one row per entity.
///
/// # Errors
/// Returns a polars error if the frame cannot be built.
pub fn snapshot_to_frame(snapshot: &FactorSnapshot) -> PolarsResult<DataFrame> {
    let basics = &snapshot.basics;
    let mut columns = vec![
        Column::new(CODE.into(), basics.iter().map(|b| b.code.as_str()).collect::<Vec<_>>()),
        Column::new("name".into(), basics.iter().map(|b| b.name.clone()).collect::<Vec<_>>()),
        Column::new("industry".into(), basics.iter().map(|b| b.industry.clone()).collect::<Vec<_>>()),
        float_column("mkt_cap_float".into(), &basics.iter().map(|b| b.mkt_cap_float).collect::<Vec<_>>()),
        Column::new(
            "is_open".into(),
            basics.iter().map(|b| b.is_open.map(|o| if o { 1.0 } else { 0.0 })).collect::<Vec<_>>(),
        ),
        float_column("pct_chg_nm".into(), &basics.iter().map(|b| b.pct_chg_nm).collect::<Vec<_>>()),
    ];
    for (name, values) in snapshot.factors.columns() {
        columns.push(float_column(name.as_str().into(), values));
    }
    DataFrame::new(columns)
}

/// Frame with one row per entity to snapshot.
///
/// # Errors
/// Returns `Format` if an identification column is missing.
pub fn snapshot_from_frame(date: Date, df: &DataFrame) -> Result<FactorSnapshot, SourceError> {
    let codes = entity_column(df)?;
    let series = |name: &str| -> Result<&Series, SourceError> {
        df.column(name)
            .map(Column::as_materialized_series)
            .map_err(|_| SourceError::Format(format!("snapshot has no {name} column")))
    };
    let names = string_values(series("name")?)?;
    let industries = string_values(series("industry")?)?;
    let caps = float_values(series("mkt_cap_float")?)?;
    let open = float_values(series("is_open")?)?;
    let fwd = float_values(series("pct_chg_nm")?)?;

    let basics = codes
        .iter()
        .enumerate()
        .map(|(i, code)| BasicRow {
            code: code.clone(),
            name: names[i].clone(),
            industry: industries[i].clone(),
            mkt_cap_float: caps[i],
            is_open: (!open[i].is_nan()).then_some(open[i] != 0.0),
            pct_chg_nm: fwd[i],
        })
        .collect();

    let mut factors = FactorTable::new(codes)?;
    for column in df.get_columns().iter().filter(|c| !BASIC_COLUMNS.contains(&c.name().as_str())) {
        factors.insert_column(column.name().as_str(), float_values(column.as_materialized_series())?)?;
    }
    Ok(FactorSnapshot::new(date, basics, factors)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn numeric_panel_round_trip() {
        let panel = Panel::from_rows(
            vec![d(2020, 1, 31), d(2020, 2, 29)],
            vec![("A".into(), vec![1.5, f64::NAN]), ("B".into(), vec![2.0, 3.0])],
        )
        .unwrap();
        let df = panel_to_frame(&panel).unwrap();
        assert_eq!(df.shape(), (2, 3));
        assert_eq!(df.column("2020-02-29").unwrap().null_count(), 1);

        let back = panel_from_frame(&df).unwrap();
        assert_eq!(back.dates(), panel.dates());
        assert_eq!(*back.get(&"B".into(), d(2020, 2, 29)).unwrap(), 3.0);
        assert!(back.get(&"A".into(), d(2020, 2, 29)).unwrap().is_nan());
    }

    #[test]
    fn string_cells_parse_as_numbers() {
        let df = df! {
            "code" => &["A", "B"],
            "2020-01-02" => &["1.25", ""],
        }
        .unwrap();
        let panel = panel_from_frame(&df).unwrap();
        assert_eq!(panel.values()[[0, 0]], 1.25);
        assert!(panel.values()[[1, 0]].is_nan());
    }

    #[test]
    fn report_dates_drop_placeholder() {
        let df = df! {
            "code" => &["A", "B"],
            "2020-03-31" => &["2019-12-31", "0"],
        }
        .unwrap();
        let panel = dates_from_frame(&df).unwrap();
        assert_eq!(panel.values()[[0, 0]], Some(d(2019, 12, 31)));
        assert_eq!(panel.values()[[1, 0]], None);
    }

    #[test]
    fn bad_header_is_format_error() {
        let df = df! { "code" => &["A"], "not-a-date" => &[1.0] }.unwrap();
        assert!(matches!(panel_from_frame(&df), Err(SourceError::Format(_))));
    }

    #[test]
    fn snapshot_frame_layout() {
        let mut factors = FactorTable::new(vec!["A".into()]).unwrap();
        factors.insert_column("EP", vec![0.05]).unwrap();
        let basics = vec![BasicRow {
            code: "A".into(),
            name: Some("Alpha".to_string()),
            industry: Some("Banks".to_string()),
            mkt_cap_float: 1e9,
            is_open: Some(true),
            pct_chg_nm: f64::NAN,
        }];
        let snapshot = FactorSnapshot::new(d(2020, 1, 31), basics, factors).unwrap();

        let df = snapshot_to_frame(&snapshot).unwrap();
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["code", "name", "industry", "mkt_cap_float", "is_open", "pct_chg_nm", "EP"]);

        let back = snapshot_from_frame(d(2020, 1, 31), &df).unwrap();
        assert_eq!(back.basics[0].is_open, Some(true));
        assert_eq!(back.factors.value(&"A".into(), "EP").unwrap(), 0.05);
    }
}
