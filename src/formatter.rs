//! CSV cell encoding for uploads.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use indexmap::IndexMap;

/// Encoding of missing values.
pub const NULL: &str = "NULL";
/// Encoding of a missing date.
pub const DATE_NULL: &str = "";
pub const BOOL_TRUE: &str = "yes";
pub const BOOL_FALSE: &str = "no";

const DATE_VALUE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_VALUE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A value of an uploaded row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

/// One row, keyed by CSV column name.
pub type Row = IndexMap<String, Cell>;

impl Cell {
    /// Interpret the cell as a point in time.
    ///
    /// Text is accepted in `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS` form;
    /// empty text and `NULL` count as missing.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::Date(date) => date.and_hms_opt(0, 0, 0),
            Cell::DateTime(datetime) => Some(*datetime),
            Cell::Text(text) => {
                let text = text.trim();
                NaiveDateTime::parse_from_str(text, DATETIME_VALUE_FORMAT)
                    .ok()
                    .or_else(|| {
                        NaiveDate::parse_from_str(text, DATE_VALUE_FORMAT)
                            .ok()
                            .and_then(|date| date.and_hms_opt(0, 0, 0))
                    })
            }
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Decimal(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Cell::Date(value)
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(value: NaiveDateTime) -> Self {
        Cell::DateTime(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Into::into)
    }
}

/// Quote a cell for the upload CSV.
pub fn csv_encode(cell: &Cell) -> String {
    let raw = match cell {
        Cell::Null => NULL.to_string(),
        Cell::Bool(true) => BOOL_TRUE.to_string(),
        Cell::Bool(false) => BOOL_FALSE.to_string(),
        Cell::Int(i) => i.to_string(),
        Cell::Decimal(d) => d.to_string(),
        Cell::Text(s) => s.clone(),
        Cell::Date(d) => d.format(DATE_VALUE_FORMAT).to_string(),
        Cell::DateTime(dt) => dt.format(DATETIME_VALUE_FORMAT).to_string(),
    };
    format!("\"{}\"", raw.replace('"', "\"\""))
}

/// GoodData day identifier: 1900-01-01 is day 1, missing dates are 0.
pub fn date_id(value: Option<NaiveDateTime>) -> i64 {
    let Some(value) = value else {
        return 0;
    };
    let origin = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN);
    (value.date() - origin).num_days() + 1
}

/// Seconds elapsed since midnight, 0 for missing values.
pub fn seconds_of_day(value: Option<NaiveDateTime>) -> i64 {
    value.map_or(0, |v| i64::from(v.num_seconds_from_midnight()))
}

/// Add the derived columns GoodData expects next to each date.
///
/// Every date column gets `<name>_dt` (day id); datetime columns also get
/// `<name>_tm` and `tm_<name>_id` (seconds of day). The date value itself
/// is normalised to text.
pub fn format_dates(row: &mut Row, dates: &[String], datetimes: &[String]) {
    for field in dates.iter().chain(datetimes) {
        let with_time = datetimes.contains(field);
        let value = row.get(field).and_then(Cell::as_datetime);

        row.insert(format!("{field}_dt"), Cell::Int(date_id(value)));
        let text = match value {
            Some(v) if with_time => v.format(DATETIME_VALUE_FORMAT).to_string(),
            Some(v) => v.format(DATE_VALUE_FORMAT).to_string(),
            None => DATE_NULL.to_string(),
        };
        row.insert(field.clone(), Cell::Text(text));

        if with_time {
            let seconds = seconds_of_day(value);
            row.insert(format!("{field}_tm"), Cell::Int(seconds));
            row.insert(format!("tm_{field}_id"), Cell::Int(seconds));
        }
    }
}

/// Render a CSV line in the order of `fields`. Missing fields are `NULL`.
pub fn csv_line(row: &Row, fields: &[&str]) -> String {
    fields
        .iter()
        .map(|field| csv_encode(row.get(*field).unwrap_or(&Cell::Null)))
        .collect::<Vec<_>>()
        .join(",")
}
