use crate::types::{ChartPoint, LongRow, WideTable};
use crate::util::format_amount;
use serde::Serialize;
use std::error::Error;
use std::io::Write;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table};

/// What the line-chart renderer needs: the points plus the axis and series
/// hints the dashboard always used (x = 月份, y = value, one line per
/// `variable`).
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChartPayload {
    pub title: String,
    pub x: &'static str,
    pub y: &'static str,
    pub color: &'static str,
    pub y_axis_title: &'static str,
    pub markers: bool,
    pub points: Vec<ChartPoint>,
}

pub fn chart_payload(title: &str, long: &[LongRow]) -> ChartPayload {
    ChartPayload {
        title: title.to_string(),
        x: "月份",
        y: "value",
        color: "variable",
        y_axis_title: "金額（元）",
        markers: true,
        points: long.iter().map(LongRow::to_chart_point).collect(),
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn write_long_csv<W: Write>(out: W, long: &[LongRow]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_writer(out);
    for r in long {
        wtr.serialize(r.to_chart_point())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Missing cells are written as empty fields.
pub fn write_wide_csv<W: Write>(out: W, table: &WideTable) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(table.header())?;
    for r in &table.rows {
        let mut record = vec![r.year.to_string(), r.month.to_string()];
        record.extend(
            r.cells
                .iter()
                .map(|c| c.map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_long_csv_file(path: &Path, long: &[LongRow]) -> Result<(), Box<dyn Error>> {
    write_long_csv(std::fs::File::create(path)?, long)
}

pub fn write_wide_csv_file(path: &Path, table: &WideTable) -> Result<(), Box<dyn Error>> {
    write_wide_csv(std::fs::File::create(path)?, table)
}

pub fn render_long(long: &[LongRow], max_rows: usize) -> Option<String> {
    let points: Vec<ChartPoint> = long.iter().take(max_rows).map(LongRow::to_chart_point).collect();
    if points.is_empty() {
        return None;
    }
    Some(Table::new(points).with(Style::markdown()).to_string())
}

pub fn render_wide(table: &WideTable, max_rows: usize) -> Option<String> {
    if table.rows.is_empty() {
        return None;
    }
    let mut builder = Builder::default();
    builder.push_record(table.header());
    for r in table.rows.iter().take(max_rows) {
        let mut record = vec![r.year.to_string(), r.month.to_string()];
        record.extend(r.cells.iter().map(|c| match c {
            Some(v) => format_amount(*v),
            None => "-".to_string(),
        }));
        builder.push_record(record);
    }
    Some(builder.build().with(Style::markdown()).to_string())
}

pub fn preview_long(long: &[LongRow], max_rows: usize) {
    match render_long(long, max_rows) {
        Some(t) => println!("{}\n", t),
        None => println!("(no rows)\n"),
    }
}

pub fn preview_wide(table: &WideTable, max_rows: usize) {
    match render_wide(table, max_rows) {
        Some(t) => println!("{}\n", t),
        None => println!("(no rows)\n"),
    }
}
