// Parsing and formatting helpers.
//
// All the forgiving CSV cell handling lives here so the loader and the
// reshaper can work with typed values only.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Outcome of reading one amount cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Empty,
    Amount(f64),
    Invalid,
}

impl Cell {
    pub fn amount(self) -> Option<f64> {
        match self {
            Cell::Amount(v) => Some(v),
            _ => None,
        }
    }
}

/// Read an amount cell the way bill spreadsheets tend to export them:
/// surrounding whitespace and thousands separators are ignored, an empty
/// cell is missing, and anything that does not parse to a finite number is
/// flagged so the caller can report it.
pub fn parse_amount(s: Option<&str>) -> Cell {
    let Some(s) = s.map(str::trim) else {
        return Cell::Empty;
    };
    if s.is_empty() {
        return Cell::Empty;
    }
    // rejects "NaN"/"inf" which f64::from_str would otherwise accept
    if s.chars().any(|c| c.is_alphabetic()) {
        return Cell::Invalid;
    }
    match s.replace(',', "").parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Amount(v),
        _ => Cell::Invalid,
    }
}

/// Integer cell that may have been written as a float by a spreadsheet
/// (`2023.0`).
pub fn parse_whole(s: Option<&str>) -> Option<i64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 {
        Some(f as i64)
    } else {
        None
    }
}

/// A (year, month) pair that names a real calendar month.
pub fn parse_period(year: Option<&str>, month: Option<&str>) -> Option<(i32, u32)> {
    let year = i32::try_from(parse_whole(year)?).ok()?;
    let month = u32::try_from(parse_whole(month)?).ok()?;
    NaiveDate::from_ymd_opt(year, month, 1).map(|_| (year, month))
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus thousands separators, e.g. `1,234,567.89`.
    let s = format!("{:.*}", decimals, n.abs());
    // no sign when the rounded value is zero
    let neg = n.is_sign_negative() && s.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let mut res = match int_part.parse::<u128>() {
        Ok(v) => v.to_formatted_string(&Locale::en),
        // past u128 range (or inf/NaN): keep the digits as printed
        Err(_) => int_part.to_string(),
    };
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Bill amounts are usually whole dollars; only show decimals when present.
pub fn format_amount(n: f64) -> String {
    if n.fract() == 0.0 {
        format_number(n, 0)
    } else {
        format_number(n, 2)
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_cells() {
        assert_eq!(parse_amount(Some(" 1,234 ")), Cell::Amount(1234.0));
        assert_eq!(parse_amount(Some("0")), Cell::Amount(0.0));
        assert_eq!(parse_amount(Some("")), Cell::Empty);
        assert_eq!(parse_amount(None), Cell::Empty);
        assert_eq!(parse_amount(Some("NaN")), Cell::Invalid);
        assert_eq!(parse_amount(Some("待補")), Cell::Invalid);
        assert_eq!(parse_amount(Some("12..5")), Cell::Invalid);
    }

    #[test]
    fn periods_must_be_real_months() {
        assert_eq!(parse_period(Some("2023"), Some("1")), Some((2023, 1)));
        assert_eq!(parse_period(Some("2023.0"), Some("12.0")), Some((2023, 12)));
        assert_eq!(parse_period(Some("2023"), Some("13")), None);
        assert_eq!(parse_period(Some("2023"), Some("0")), None);
        assert_eq!(parse_period(Some("abc"), Some("1")), None);
        assert_eq!(parse_period(Some("2023"), Some("1.5")), None);
    }

    #[test]
    fn amounts_format_with_separators() {
        assert_eq!(format_amount(1234.0), "1,234");
        assert_eq!(format_amount(1234.5), "1,234.50");
        assert_eq!(format_amount(-50.0), "-50");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn huge_and_tiny_amounts_format_sanely() {
        assert_eq!(format_amount(1e19), "10,000,000,000,000,000,000");
        assert_eq!(format_number(-0.001, 2), "0.00");
        assert_eq!(format_amount(-0.001), "0.00");
        assert_eq!(format_number(-0.005, 1), "0.0");
        assert_eq!(format_number(-1.5, 1), "-1.5");
    }
}
