//! Helpers shared by the reducers.

use tessera_primitives::{EntityId, FactorTable, Panel};

use crate::FactorError;

/// Assemble named columns aligned with `entities` into a table.
pub(crate) fn build_table(
    entities: &[EntityId],
    columns: Vec<(String, Vec<f64>)>,
) -> Result<FactorTable, FactorError> {
    let mut table = FactorTable::new(entities.to_vec())?;
    for (name, values) in columns {
        table.insert_column(name, values)?;
    }
    Ok(table)
}

/// Apply `f` to each entity's row.
pub(crate) fn per_row(panel: &Panel, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    panel.values().rows().into_iter().map(|row| f(&row.to_vec())).collect()
}

/// Whether any value in the row is missing.
pub(crate) fn has_missing(row: &[f64]) -> bool {
    row.iter().any(|v| v.is_nan())
}
