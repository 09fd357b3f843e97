//! Wide and long forms of one property's bills.
//!
//! A source row carries every fee category for one month. For charting, each
//! (year, category) pair becomes its own series, so the rows are spread out
//! into one column per pair (wide form) and then melted into one point per
//! non-missing cell (long form).

use crate::error::BillError;
use crate::schema::PropertySchema;
use crate::types::{BillRow, LongRow, Selection, SeriesKey, WideRow, WideTable};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reshaped {
    pub wide: WideTable,
    pub long: Vec<LongRow>,
}

impl Reshaped {
    pub fn columns(&self) -> &[SeriesKey] {
        &self.wide.columns
    }

    pub fn is_empty(&self) -> bool {
        self.long.is_empty()
    }
}

/// Every selected category must come from the property's vocabulary.
pub fn validate_selection(selection: &Selection, schema: &PropertySchema) -> Result<(), BillError> {
    match selection.categories().iter().find(|c| !schema.has_category(c)) {
        Some(c) => Err(BillError::UnknownCategory {
            property: schema.id.clone(),
            category: c.clone(),
        }),
        None => Ok(()),
    }
}

/// Column keys for a selection: years ascending, categories in selection
/// order within each year.
pub fn series_keys(selection: &Selection, tag: Option<&str>) -> Vec<SeriesKey> {
    selection
        .years()
        .iter()
        .flat_map(|year| {
            selection
                .categories()
                .iter()
                .map(move |category| SeriesKey::new(*year, tag, category))
        })
        .collect()
}

/// Build the wide table and long form for one property.
///
/// The wide table has exactly one column per selected (year, category) pair,
/// even where the data has nothing for that pair. An empty selection yields
/// an empty result.
pub fn reshape(
    rows: &[BillRow],
    selection: &Selection,
    schema: &PropertySchema,
    tag: Option<&str>,
) -> Result<Reshaped, BillError> {
    validate_selection(selection, schema)?;
    if selection.is_empty() {
        warn!(property = %schema.id, "empty year or category selection, nothing to display");
        return Ok(Reshaped::default());
    }

    let columns = series_keys(selection, tag);
    let wide_rows: Vec<WideRow> = rows
        .iter()
        .filter(|r| selection.years().contains(&r.year))
        .map(|r| WideRow {
            year: r.year,
            month: r.month,
            cells: columns.iter().map(|key| cell_for(r, key)).collect(),
        })
        .collect();

    let wide = WideTable {
        columns,
        rows: wide_rows,
    };
    let long = melt(&wide);
    debug!(
        property = %schema.id,
        columns = wide.columns.len(),
        rows = wide.rows.len(),
        points = long.len(),
        "reshaped"
    );
    Ok(Reshaped { wide, long })
}

fn cell_for(row: &BillRow, key: &SeriesKey) -> Option<f64> {
    if row.year != key.year {
        return None;
    }
    match row.amount(&key.category) {
        Some(v) if !v.is_finite() => {
            warn!(
                year = row.year,
                month = row.month,
                category = %key.category,
                "non-finite amount treated as missing"
            );
            None
        }
        other => other,
    }
}

/// One point per present cell, column by column.
pub fn melt(wide: &WideTable) -> Vec<LongRow> {
    let mut long = Vec::new();
    for (col, key) in wide.columns.iter().enumerate() {
        for row in &wide.rows {
            if let Some(value) = row.cells.get(col).copied().flatten() {
                long.push(LongRow {
                    year: row.year,
                    month: row.month,
                    key: key.clone(),
                    value,
                });
            }
        }
    }
    long
}
