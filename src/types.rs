use crate::error::BillError;
use crate::util::format_amount;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tabled::Tabled;

pub const YEAR_COLUMN: &str = "年份";
pub const MONTH_COLUMN: &str = "月份";

/// One month of bills for one property, as read from its CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct BillRow {
    pub year: i32,
    pub month: u32,
    pub amounts: BTreeMap<String, Option<f64>>,
}

impl BillRow {
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            amounts: BTreeMap::new(),
        }
    }

    /// Builder-style helper, mostly for fixtures.
    pub fn with(mut self, category: &str, amount: Option<f64>) -> Self {
        self.amounts.insert(category.to_string(), amount);
        self
    }

    pub fn amount(&self, category: &str) -> Option<f64> {
        self.amounts.get(category).copied().flatten()
    }
}

/// The years and fee categories a user picked for one query.
///
/// Years are kept ascending; categories keep the order they were picked in
/// with duplicates dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    years: BTreeSet<i32>,
    categories: Vec<String>,
}

impl Selection {
    pub fn new<Y, C, S>(years: Y, categories: C) -> Self
    where
        Y: IntoIterator<Item = i32>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut picked: Vec<String> = Vec::new();
        for c in categories {
            let c = c.into();
            if !picked.contains(&c) {
                picked.push(c);
            }
        }
        Self {
            years: years.into_iter().collect(),
            categories: picked,
        }
    }

    pub fn years(&self) -> &BTreeSet<i32> {
        &self.years
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty() || self.categories.is_empty()
    }

    /// Same years, different categories. Used when one selection is carried
    /// over to a second property.
    pub fn with_categories(&self, categories: Vec<String>) -> Self {
        Self::new(self.years.iter().copied(), categories)
    }
}

/// Identifies one chart series / table column: a fee category in a given
/// year, optionally tagged with the property it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub year: i32,
    pub tag: Option<String>,
    pub category: String,
}

impl SeriesKey {
    pub fn new(year: i32, tag: Option<&str>, category: &str) -> Self {
        Self {
            year,
            tag: tag.map(str::to_string),
            category: category.to_string(),
        }
    }

    /// Display label, e.g. `2023電費` or `2023綠園電費`.
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Recover a key from a display label.
    ///
    /// The year must prefix the label and a vocabulary entry must end it.
    /// Categories are tried longest first so `2023公共電費` resolves to
    /// `公共電費` rather than `電費`. Whatever sits between year and category
    /// has to be one of `tags`; anything else is an error, as is a label that
    /// splits into a known tag and category in more than one way.
    pub fn parse(
        label: &str,
        years: &BTreeSet<i32>,
        tags: &[&str],
        vocabulary: &[String],
    ) -> Result<Self, BillError> {
        let fail = |reason: String| BillError::AmbiguousSeries {
            label: label.to_string(),
            reason,
        };

        let (year, rest) = years
            .iter()
            .filter_map(|y| {
                let prefix = y.to_string();
                label.strip_prefix(prefix.as_str()).map(|rest| (*y, rest))
            })
            // shortest remainder = longest year prefix
            .min_by_key(|(_, rest)| rest.len())
            .ok_or_else(|| fail("no selected year prefixes it".to_string()))?;

        let mut candidates: Vec<&String> =
            vocabulary.iter().filter(|c| rest.ends_with(c.as_str())).collect();
        candidates.sort_by(|a, b| b.len().cmp(&a.len()));
        let longest = candidates
            .first()
            .ok_or_else(|| fail("no known category ends it".to_string()))?;

        // every (tag, category) split that explains the whole remainder
        let readings: Vec<(Option<&str>, &String)> = candidates
            .iter()
            .filter_map(|c| {
                let middle = &rest[..rest.len() - c.len()];
                if middle.is_empty() {
                    Some((None, *c))
                } else if tags.contains(&middle) {
                    Some((Some(middle), *c))
                } else {
                    None
                }
            })
            .collect();

        let (tag, category) = match readings.as_slice() {
            [only] => *only,
            [] => {
                let middle = &rest[..rest.len() - longest.len()];
                return Err(fail(format!("unrecognised text `{}`", middle)));
            }
            [first, second, ..] => {
                return Err(fail(format!(
                    "reads as both `{}` and `{}`",
                    first.1, second.1
                )));
            }
        };

        Ok(SeriesKey::new(year, tag, category))
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.year,
            self.tag.as_deref().unwrap_or(""),
            self.category
        )
    }
}

/// One period of the wide table. `cells` lines up with `WideTable::columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    pub columns: Vec<SeriesKey>,
    pub rows: Vec<WideRow>,
}

impl WideTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `年份`, `月份`, then one label per column.
    pub fn header(&self) -> Vec<String> {
        let mut h = vec![YEAR_COLUMN.to_string(), MONTH_COLUMN.to_string()];
        h.extend(self.columns.iter().map(SeriesKey::label));
        h
    }

    pub fn column_index(&self, key: &SeriesKey) -> Option<usize> {
        self.columns.iter().position(|c| c == key)
    }

    pub fn value(&self, row: usize, key: &SeriesKey) -> Option<f64> {
        let col = self.column_index(key)?;
        self.rows.get(row)?.cells.get(col).copied().flatten()
    }

    /// Stable sort by (year, month).
    pub fn sort_by_period(&mut self) {
        self.rows.sort_by_key(|r| (r.year, r.month));
    }
}

/// One plotted point. Never carries a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRow {
    pub year: i32,
    pub month: u32,
    pub key: SeriesKey,
    pub value: f64,
}

impl LongRow {
    pub fn variable(&self) -> String {
        self.key.label()
    }

    pub fn category(&self) -> &str {
        &self.key.category
    }

    pub fn variable_year(&self) -> i32 {
        self.key.year
    }

    pub fn to_chart_point(&self) -> ChartPoint {
        ChartPoint {
            year: self.year,
            month: self.month,
            variable: self.variable(),
            value: self.value,
            category: self.key.category.clone(),
            variable_year: self.key.year,
        }
    }
}

/// Long-form row as handed to the chart renderer and the long CSV export.
#[derive(Debug, Serialize, Deserialize, Tabled, Clone, PartialEq)]
pub struct ChartPoint {
    #[serde(rename = "年份")]
    #[tabled(rename = "年份")]
    pub year: i32,
    #[serde(rename = "月份")]
    #[tabled(rename = "月份")]
    pub month: u32,
    #[serde(rename = "variable")]
    #[tabled(rename = "variable")]
    pub variable: String,
    #[serde(rename = "value")]
    #[tabled(rename = "value")]
    #[tabled(display_with = "display_amount")]
    pub value: f64,
    #[serde(rename = "項目")]
    #[tabled(rename = "項目")]
    pub category: String,
    #[serde(rename = "變數年份")]
    #[tabled(rename = "變數年份")]
    pub variable_year: i32,
}

fn display_amount(v: &f64) -> String {
    format_amount(*v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn label_concatenates_year_tag_and_category() {
        assert_eq!(SeriesKey::new(2023, None, "電費").label(), "2023電費");
        assert_eq!(
            SeriesKey::new(2024, Some("奧斯卡"), "水費").label(),
            "2024奧斯卡水費"
        );
    }

    #[test]
    fn parse_prefers_the_longest_category() {
        let years = BTreeSet::from([2023]);
        let key = SeriesKey::parse("2023公共電費", &years, &[], &vocab(&["電費", "公共電費"]))
            .expect("label should parse");
        assert_eq!(key.category, "公共電費");
        assert_eq!(key.year, 2023);
        assert_eq!(key.tag, None);
    }

    #[test]
    fn parse_recovers_property_tag() {
        let years = BTreeSet::from([2023, 2024]);
        let key = SeriesKey::parse(
            "2024奧斯卡純住宅電費",
            &years,
            &["綠園", "奧斯卡"],
            &vocab(&["總電費", "純住宅電費", "公共電費", "水費"]),
        )
        .expect("label should parse");
        assert_eq!(key, SeriesKey::new(2024, Some("奧斯卡"), "純住宅電費"));
    }

    #[test]
    fn parse_rejects_unexplained_text() {
        let years = BTreeSet::from([2023]);
        let err = SeriesKey::parse("2023路燈電費", &years, &["綠園"], &vocab(&["電費"]))
            .unwrap_err();
        assert!(matches!(err, BillError::AmbiguousSeries { .. }));
    }

    #[test]
    fn parse_rejects_label_with_two_readings() {
        let years = BTreeSet::from([2023]);
        // `公共` + `電費` and plain `公共電費` both explain the label
        let err = SeriesKey::parse("2023公共電費", &years, &["公共"], &vocab(&["電費", "公共電費"]))
            .unwrap_err();
        assert!(matches!(err, BillError::AmbiguousSeries { .. }));
    }

    #[test]
    fn parse_rejects_unselected_year() {
        let years = BTreeSet::from([2024]);
        let err = SeriesKey::parse("2023電費", &years, &[], &vocab(&["電費"])).unwrap_err();
        assert!(matches!(err, BillError::AmbiguousSeries { .. }));
    }

    #[test]
    fn selection_dedupes_categories_in_order() {
        let s = Selection::new([2024, 2023, 2024], ["水費", "電費", "水費"]);
        assert_eq!(s.years().iter().copied().collect::<Vec<_>>(), vec![2023, 2024]);
        assert_eq!(s.categories(), &["水費".to_string(), "電費".to_string()]);
        assert!(!s.is_empty());
        assert!(Selection::new([2023], Vec::<String>::new()).is_empty());
    }
}
