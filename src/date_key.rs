//! Date key extraction
//!
//! Every export carries its broadcast date in the field with ID 1004, e.g.
//! `<OM_DATETIME>20240315T081500,000</OM_DATETIME>`. Only the first such
//! field in a document counts.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Marker of the broadcast date field
pub const DATE_FIELD_MARKER: &str = r#"FieldID = "1004""#;

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{4})([0-9]{2})([0-9]{2})T").expect("date pattern is valid"));

/// Errors for a date field that is present but unusable
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateKeyError {
    #[error("line {line}: date field has no YYYYMMDDT value")]
    NoDate { line: usize },

    #[error("line {line}: {value} is not a calendar date")]
    InvalidDate { line: usize, value: String },
}

/// ISO week-year and week number
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekKey {
    pub year: i32,
    pub week: u32,
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}_W{:02}", self.year, self.week)
    }
}

/// Canonical date identity of one export.
///
/// `DateKey::default()` is the zero key used when a document has no date
/// field and the run is configured to degrade instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateKey {
    /// English weekday name, e.g. `Friday`
    pub weekday: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub iso_week: u32,
    pub iso_year: i32,
}

impl DateKey {
    /// Build the key for a calendar date
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            weekday: date.format("%A").to_string(),
            year: date.year(),
            month: date.month(),
            day: date.day(),
            iso_week: iso.week(),
            iso_year: iso.year(),
        }
    }

    /// The ISO week-year and week of this date
    pub fn week_key(&self) -> WeekKey {
        WeekKey {
            year: self.iso_year,
            week: self.iso_week,
        }
    }

    /// Whether this is the placeholder key for an undated file
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Parse the date value out of a date field line
pub fn parse_date_line(line: &str, line_number: usize) -> Result<DateKey, DateKeyError> {
    let caps = DATE_PATTERN
        .captures(line)
        .ok_or(DateKeyError::NoDate { line: line_number })?;
    let value = format!("{}{}{}", &caps[1], &caps[2], &caps[3]);
    let date = NaiveDate::parse_from_str(&value, "%Y%m%d")
        .map_err(|_| DateKeyError::InvalidDate { line: line_number, value })?;
    Ok(DateKey::from_date(date))
}

/// Scans lines for the first date field
#[derive(Debug, Default)]
pub struct DateKeyScanner {
    line: usize,
    result: Option<Result<DateKey, DateKeyError>>,
}

impl DateKeyScanner {
    /// Create a scanner that has seen no lines
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next line. Lines after the first date field are ignored.
    pub fn observe(&mut self, line: &str) {
        self.line += 1;
        if self.result.is_some() || !line.contains(DATE_FIELD_MARKER) {
            return;
        }
        self.result = Some(parse_date_line(line, self.line));
    }

    pub fn is_done(&self) -> bool {
        self.result.is_some()
    }

    /// `Ok(None)` when no date field was seen
    pub fn finish(self) -> Result<Option<DateKey>, DateKeyError> {
        self.result.transpose()
    }
}

/// Extract the date key from a sequence of lines
pub fn extract_date_key<I, S>(lines: I) -> Result<Option<DateKey>, DateKeyError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut scanner = DateKeyScanner::new();
    for line in lines {
        scanner.observe(line.as_ref());
        if scanner.is_done() {
            break;
        }
    }
    scanner.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date_line(value: &str) -> String {
        format!(
            r#"<OM_FIELD FieldType = "3" FieldID = "1004" FieldName = "Date" IsEmpty = "no"><OM_DATETIME>{}</OM_DATETIME></OM_FIELD>"#,
            value
        )
    }

    #[test]
    fn test_extract_friday_week_11() {
        let lines = vec!["<OPENMEDIA>".to_string(), date_line("20240315T081500,000")];
        let key = extract_date_key(&lines).unwrap().unwrap();

        assert_eq!(key.weekday, "Friday");
        assert_eq!((key.year, key.month, key.day), (2024, 3, 15));
        assert_eq!((key.iso_year, key.iso_week), (2024, 11));
        assert_eq!(key.week_key().to_string(), "2024_W11");
    }

    #[test]
    fn test_first_match_wins() {
        let lines = vec![date_line("20240101T000000,000"), date_line("20240315T000000,000")];
        let key = extract_date_key(&lines).unwrap().unwrap();
        assert_eq!((key.month, key.day), (1, 1));
        assert_eq!(key.weekday, "Monday");
    }

    #[test]
    fn test_iso_year_differs_at_year_boundary() {
        let key = extract_date_key([date_line("20241230T120000,000")]).unwrap().unwrap();
        assert_eq!(key.year, 2024);
        assert_eq!((key.iso_year, key.iso_week), (2025, 1));

        let key = extract_date_key([date_line("20210101T120000,000")]).unwrap().unwrap();
        assert_eq!((key.iso_year, key.iso_week), (2020, 53));
    }

    #[test]
    fn test_missing_field_is_none() {
        let lines = ["<OPENMEDIA>", r#"<OM_FIELD FieldID = "8">20240315T</OM_FIELD>"#];
        assert_eq!(extract_date_key(lines).unwrap(), None);
    }

    #[test]
    fn test_field_without_date_is_an_error() {
        let lines = ["<OPENMEDIA>", r#"<OM_FIELD FieldID = "1004" IsEmpty = "yes"></OM_FIELD>"#];
        assert_eq!(extract_date_key(lines), Err(DateKeyError::NoDate { line: 2 }));
    }

    #[test]
    fn test_impossible_date_is_an_error() {
        let err = extract_date_key([date_line("20240231T000000,000")]).unwrap_err();
        assert_eq!(err, DateKeyError::InvalidDate { line: 1, value: "20240231".into() });
    }

    #[test]
    fn test_zero_key() {
        let key = DateKey::default();
        assert!(key.is_zero());
        assert_eq!(key.week_key().to_string(), "0000_W00");
    }
}
