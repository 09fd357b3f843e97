use crate::error::BillError;
use crate::schema::PropertySchema;
use crate::types::{BillRow, MONTH_COLUMN, YEAR_COLUMN};
use crate::util::{parse_amount, parse_period, Cell};
use csv::ReaderBuilder;
use std::collections::BTreeSet;
use std::error::Error;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub skipped_rows: usize,
    pub non_numeric_cells: usize,
}

pub fn load_bills_file(
    path: &Path,
    schema: &PropertySchema,
) -> Result<(Vec<BillRow>, LoadReport), Box<dyn Error>> {
    let file = std::fs::File::open(path)
        .map_err(|e| format!("failed to open {}: {}", path.display(), e))?;
    load_bills(file, &path.display().to_string(), schema)
}

/// Read one property's bill table.
///
/// `年份`, `月份` and every vocabulary column must be present. Rows whose
/// year/month is not a real calendar month are skipped; amount cells that do
/// not parse become missing. Both are counted in the report.
pub fn load_bills<R: Read>(
    input: R,
    source_name: &str,
    schema: &PropertySchema,
) -> Result<(Vec<BillRow>, LoadReport), Box<dyn Error>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(input);
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect();

    let find = |name: &str| -> Result<usize, BillError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| BillError::MissingColumn {
                source_name: source_name.to_string(),
                column: name.to_string(),
            })
    };
    let year_idx = find(YEAR_COLUMN)?;
    let month_idx = find(MONTH_COLUMN)?;
    let mut category_idx: Vec<(&str, usize)> = Vec::with_capacity(schema.vocabulary.len());
    for category in &schema.vocabulary {
        category_idx.push((category.as_str(), find(category.as_str())?));
    }

    let known: BTreeSet<&str> = schema
        .vocabulary
        .iter()
        .map(String::as_str)
        .chain([YEAR_COLUMN, MONTH_COLUMN])
        .collect();
    for extra in headers.iter().filter(|h| !h.is_empty() && !known.contains(h.as_str())) {
        warn!(source = source_name, column = %extra, "column not in {} vocabulary, ignored", schema.id);
    }

    let mut report = LoadReport::default();
    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        report.total_rows += 1;
        // header is line 1
        let line = idx + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(source = source_name, line, error = %e, "unreadable row skipped");
                report.skipped_rows += 1;
                continue;
            }
        };

        let Some((year, month)) = parse_period(record.get(year_idx), record.get(month_idx)) else {
            warn!(
                source = source_name,
                line,
                year = record.get(year_idx).unwrap_or(""),
                month = record.get(month_idx).unwrap_or(""),
                "row without a valid year/month skipped"
            );
            report.skipped_rows += 1;
            continue;
        };

        let mut row = BillRow::new(year, month);
        for (category, col) in &category_idx {
            let raw = record.get(*col);
            let cell = parse_amount(raw);
            if cell == Cell::Invalid {
                warn!(
                    source = source_name,
                    line,
                    category = *category,
                    value = raw.unwrap_or(""),
                    "non-numeric amount treated as missing"
                );
                report.non_numeric_cells += 1;
            }
            row.amounts.insert(category.to_string(), cell.amount());
        }
        rows.push(row);
    }

    report.loaded_rows = rows.len();
    info!(
        source = source_name,
        total = report.total_rows,
        loaded = report.loaded_rows,
        skipped = report.skipped_rows,
        non_numeric = report.non_numeric_cells,
        "bill table loaded"
    );
    debug!(source = source_name, years = ?available_years(&rows), "years present");
    Ok((rows, report))
}

/// Distinct years present in the data, ascending.
pub fn available_years(rows: &[BillRow]) -> Vec<i32> {
    rows.iter()
        .map(|r| r.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
