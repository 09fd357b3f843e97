//! Two properties on one chart.
//!
//! Each property is reshaped on its own with its tag in the series labels.
//! The secondary property's categories are translated through the primary's
//! alias table first, so e.g. 綠園's 電費 is compared with 奧斯卡's 純住宅電費.

use crate::align::align;
use crate::error::BillError;
use crate::reshape::{reshape, Reshaped};
use crate::schema::PropertySchema;
use crate::types::{BillRow, LongRow, Selection, WideRow, WideTable};
use tracing::debug;

/// One property's schema and loaded rows.
#[derive(Debug, Clone, Copy)]
pub struct PropertyData<'a> {
    pub schema: &'a PropertySchema,
    pub rows: &'a [BillRow],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub primary: Reshaped,
    pub secondary: Reshaped,
    /// The selection actually used for the secondary property.
    pub secondary_selection: Selection,
    /// Primary points followed by secondary points.
    pub long: Vec<LongRow>,
    /// Both wide tables merged, sorted by (year, month).
    pub table: WideTable,
}

impl Comparison {
    /// True when either side has nothing to plot.
    pub fn is_incomplete(&self) -> bool {
        self.primary.is_empty() || self.secondary.is_empty()
    }
}

pub fn compare(
    primary: PropertyData<'_>,
    secondary: PropertyData<'_>,
    selection: &Selection,
) -> Result<Comparison, BillError> {
    if primary.schema.tag == secondary.schema.tag {
        return Err(BillError::InvalidSchema {
            property: secondary.schema.id.clone(),
            reason: format!("tag `{}` is shared with {}", secondary.schema.tag, primary.schema.id),
        });
    }

    let secondary_selection =
        selection.with_categories(align(selection.categories(), &primary.schema.aliases));
    debug!(
        primary = %primary.schema.id,
        secondary = %secondary.schema.id,
        categories = ?secondary_selection.categories(),
        "aligned secondary selection"
    );

    let a = reshape(primary.rows, selection, primary.schema, Some(primary.schema.tag.as_str()))?;
    let b = reshape(
        secondary.rows,
        &secondary_selection,
        secondary.schema,
        Some(secondary.schema.tag.as_str()),
    )?;

    let long: Vec<LongRow> = a.long.iter().chain(b.long.iter()).cloned().collect();
    let table = merge_tables(&a.wide, &b.wide);

    Ok(Comparison {
        primary: a,
        secondary: b,
        secondary_selection,
        long,
        table,
    })
}

/// Stack two wide tables under the union of their columns.
///
/// Rows keep their own cells and are missing in the other table's columns.
/// The result is stably sorted by (year, month), so for the same period rows
/// from `first` come before rows from `second`.
pub fn merge_tables(first: &WideTable, second: &WideTable) -> WideTable {
    let mut columns = first.columns.clone();
    columns.extend(second.columns.iter().cloned());

    let width_first = first.columns.len();
    let width_second = second.columns.len();
    let mut rows: Vec<WideRow> = Vec::with_capacity(first.rows.len() + second.rows.len());
    for r in &first.rows {
        let mut cells = r.cells.clone();
        cells.resize(width_first + width_second, None);
        rows.push(WideRow {
            year: r.year,
            month: r.month,
            cells,
        });
    }
    for r in &second.rows {
        let mut cells = vec![None; width_first];
        cells.extend(r.cells.iter().copied());
        rows.push(WideRow {
            year: r.year,
            month: r.month,
            cells,
        });
    }

    let mut table = WideTable { columns, rows };
    table.sort_by_period();
    table
}
