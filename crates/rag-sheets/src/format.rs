//! Cell value rendering
//!
//! Turns a raw [`CellValue`] and its number format into the text a reader of
//! the spreadsheet would see. Format detection is deliberately shallow: the
//! pattern is searched for `%`, an exponent marker or a thousands separator,
//! in that order, and anything else renders as a plain number.

use chrono::NaiveDateTime;
use lazy_regex::regex_captures;
use rag_sheets_core::{CellValue, NumberFormat};

/// Render a cell value under a number format
///
/// Never fails; unknown patterns fall back to the plain number rendering.
///
/// ```
/// use rag_sheets::format_cell;
/// use rag_sheets_core::{CellValue, NumberFormat};
///
/// let pct = NumberFormat::from_string("0.00%");
/// assert_eq!(format_cell(&CellValue::Number(0.1234), &pct), "12.34%");
///
/// let yen = NumberFormat::from_string("¥#,##0");
/// assert_eq!(format_cell(&CellValue::Number(1_000_000.0), &yen), "¥1,000,000");
/// ```
pub fn format_cell(value: &CellValue, format: &NumberFormat) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::DateTime(dt) => format_datetime(dt, format.format_string()),
        CellValue::Number(n) => format_number(*n, format.format_string()),
        other => other.to_string(),
    }
}

fn format_datetime(dt: &NaiveDateTime, pattern: &str) -> String {
    if pattern.contains(['h', 'H']) {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}

/// Render a number under a format pattern string
pub fn format_number(value: f64, pattern: &str) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    if pattern.contains('%') {
        let decimals = regex_captures!(r"0\.(0+)%", pattern)
            .map(|(_, zeros)| zeros.len())
            .unwrap_or(0);
        return format!("{:.*}%", decimals, value * 100.0);
    }

    if pattern != "General" && pattern.to_uppercase().contains('E') {
        let decimals = regex_captures!(r"(?i)0\.(0+)E", pattern)
            .map(|(_, zeros)| zeros.len())
            .unwrap_or(2);
        return format_scientific(value, decimals);
    }

    if pattern.contains("#,##") || pattern.contains(",0") {
        let decimals = regex_captures!(r"0\.(0+)", pattern)
            .map(|(_, zeros)| zeros.len())
            .unwrap_or(0);
        let grouped = group_thousands(value, decimals);
        return if pattern.contains(['¥', '￥']) {
            format!("¥{grouped}")
        } else if pattern.contains('$') {
            format!("${grouped}")
        } else {
            grouped
        };
    }

    format_plain(value)
}

/// Integral values lose their decimal point, everything else keeps the
/// shortest round-trip representation
fn format_plain(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

/// `1234.56` with 2 decimals renders as `1.23E+03`
fn format_scientific(value: f64, decimals: usize) -> String {
    let raw = format!("{:.*E}", decimals, value);
    match raw.split_once('E') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}E{sign}{:02}", exponent.abs())
        }
        None => raw,
    }
}

fn group_thousands(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    if value.is_sign_negative() && fixed.bytes().any(|b| (b'1'..=b'9').contains(&b)) {
        out.push('-');
    }
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}
