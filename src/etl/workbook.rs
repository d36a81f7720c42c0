//! Workbook exports and cell coercion.
//!
//! A workbook export is a JSON object mapping each sheet name to its rows,
//! each row an object keyed by column header. Empty cells are `null` or
//! absent. Date-formatted cells are ISO-8601 strings.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::lifecycle::parse_measurement_or_zero;
use crate::time::{format_duration, minutes_since_midnight, MINUTES_PER_DAY};

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Workbook {
    sheets: BTreeMap<String, Vec<Row>>,
}

impl Workbook {
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rows of `name`. Sheet names in plant reports carry stray trailing
    /// spaces, so an exact match is tried first, then a trimmed one.
    pub fn sheet(&self, name: &str) -> Option<&[Row]> {
        self.sheets
            .get(name)
            .or_else(|| {
                self.sheets
                    .iter()
                    .find(|(k, _)| k.trim() == name.trim())
                    .map(|(_, rows)| rows)
            })
            .map(Vec::as_slice)
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }
}

/// Cell rendered as text. Whole numbers lose their fractional part, so a
/// batch number stored as `1520.0` reads `"1520"`. Empty cells are `None`.
pub fn cell_text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                (f as i64).to_string()
            }
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric cell, with numeric strings parsed. Anything else is `0`.
pub fn cell_number(row: &Row, column: &str) -> f64 {
    cell_optional_number(row, column).unwrap_or(0.0)
}

/// Numeric cell, `None` when empty.
pub fn cell_optional_number(row: &Row, column: &str) -> Option<f64> {
    match row.get(column)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.trim().is_empty() => Some(parse_measurement_or_zero(s)),
        _ => None,
    }
}

/// Whole count, `None` when empty or not a number.
pub fn cell_count(row: &Row, column: &str) -> Option<u32> {
    let value = match row.get(column)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (value.is_finite() && value >= 0.0).then(|| value.trunc() as u32)
}

/// Minutes since midnight for a time cell.
///
/// Accepts ISO datetimes (the time of day is used), `"HH:MM"`,
/// `"H:MM AM/PM"`, and spreadsheet day fractions such as `0.5` for noon.
pub fn cell_minutes(row: &Row, column: &str) -> Option<i64> {
    match row.get(column)? {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                let t = dt.naive_utc().time();
                return Some((t.hour() * 60 + t.minute()) as i64);
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                return Some((dt.hour() * 60 + dt.minute()) as i64);
            }
            if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S") {
                return Some((t.hour() * 60 + t.minute()) as i64);
            }
            minutes_since_midnight(s)
        }
        Value::Number(n) => {
            let fraction = n.as_f64()?.fract();
            if fraction < 0.0 {
                return None;
            }
            Some(((fraction * MINUTES_PER_DAY as f64).round() as i64) % MINUTES_PER_DAY)
        }
        _ => None,
    }
}

/// Time cell as `"HH:MM"`, empty when missing or unreadable.
pub fn cell_time(row: &Row, column: &str) -> String {
    cell_minutes(row, column)
        .map(|m| format!("{:02}:{:02}", m / 60, m % 60))
        .unwrap_or_default()
}

/// Duration cell (stored as a time of day) as `"Xh Ym"`.
pub fn cell_duration(row: &Row, column: &str) -> String {
    cell_minutes(row, column)
        .map(format_duration)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_sheet_lookup_tolerates_trailing_space() {
        let wb = Workbook::from_json(r#"{"1. Batching ": [{"Batch No.": 1}], "5.Autoclave": []}"#)
            .unwrap();
        assert_eq!(wb.sheet("1. Batching ").unwrap().len(), 1);
        assert_eq!(wb.sheet("1. Batching").unwrap().len(), 1);
        assert!(wb.sheet("5.Autoclave").unwrap().is_empty());
        assert!(wb.sheet("6.Segregation Report").is_none());
    }

    #[test]
    fn test_cell_text() {
        let r = row(json!({"a": 1520, "b": 1520.0, "c": " M-3 ", "d": null, "e": "", "f": 2.5}));
        assert_eq!(cell_text(&r, "a").as_deref(), Some("1520"));
        assert_eq!(cell_text(&r, "b").as_deref(), Some("1520"));
        assert_eq!(cell_text(&r, "c").as_deref(), Some("M-3"));
        assert_eq!(cell_text(&r, "d"), None);
        assert_eq!(cell_text(&r, "e"), None);
        assert_eq!(cell_text(&r, "f").as_deref(), Some("2.5"));
        assert_eq!(cell_text(&r, "missing"), None);
    }

    #[test]
    fn test_cell_numbers() {
        let r = row(json!({"a": 2395, "b": "47.5", "c": "n/a", "d": null, "e": 3}));
        assert_eq!(cell_number(&r, "a"), 2395.0);
        assert_eq!(cell_number(&r, "b"), 47.5);
        assert_eq!(cell_number(&r, "c"), 0.0);
        assert_eq!(cell_number(&r, "d"), 0.0);
        assert_eq!(cell_optional_number(&r, "d"), None);
        assert_eq!(cell_count(&r, "e"), Some(3));
        assert_eq!(cell_count(&r, "c"), None);
        assert_eq!(cell_count(&r, "d"), None);
    }

    #[test]
    fn test_cell_time_formats() {
        let r = row(json!({
            "iso": "1899-12-30T22:46:00.000Z",
            "naive": "1899-12-30T05:07:00",
            "hm": "7:05",
            "hms": "13:38:00",
            "ampm": "10:46 PM",
            "fraction": 0.5,
            "junk": "later",
        }));
        assert_eq!(cell_time(&r, "iso"), "22:46");
        assert_eq!(cell_time(&r, "naive"), "05:07");
        assert_eq!(cell_time(&r, "hm"), "07:05");
        assert_eq!(cell_time(&r, "hms"), "13:38");
        assert_eq!(cell_time(&r, "ampm"), "22:46");
        assert_eq!(cell_time(&r, "fraction"), "12:00");
        assert_eq!(cell_time(&r, "junk"), "");
        assert_eq!(cell_time(&r, "missing"), "");
    }

    #[test]
    fn test_cell_duration() {
        let r = row(json!({"d": "1899-12-30T00:45:00.000Z", "long": "02:05"}));
        assert_eq!(cell_duration(&r, "d"), "0h 45m");
        assert_eq!(cell_duration(&r, "long"), "2h 5m");
    }
}
