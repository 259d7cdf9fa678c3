use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Tokens read as missing values, compared case-insensitively after trimming.
const NA_TOKENS: &[&str] = &[
    "na", "n/a", "#n/a", "#n/a n/a", "#na", "nan", "-nan", "null", "none", "<na>", "-1.#ind",
    "1.#ind", "-1.#qnan", "1.#qnan",
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null, or a float with no SQL spelling (`inf`, `-inf`).
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => !f.is_finite(),
            _ => false,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Boolean(b) => b.to_string(),
            Value::Timestamp(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Renders the value as a MySQL literal.
    ///
    /// Text is single-quoted with embedded quotes and backslashes doubled so
    /// the literal cannot terminate early. Non-finite floats have no SQL
    /// spelling and become `NULL`.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::String(s) => quote_sql_text(s),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) if f.is_finite() => format_float(*f),
            Value::Float(_) => "NULL".to_string(),
            Value::Boolean(true) => "TRUE".to_string(),
            Value::Boolean(false) => "FALSE".to_string(),
            Value::Timestamp(ts) => quote_sql_text(&ts.format(TIMESTAMP_FORMAT).to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub fn quote_sql_text(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        match ch {
            '\'' => quoted.push_str("''"),
            '\\' => quoted.push_str("\\\\"),
            other => quoted.push(other),
        }
    }
    quoted.push('\'');
    quoted
}

/// Shortest round-trip form, keeping a `.0` on integral values so the
/// literal still reads as a float.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

pub fn is_na_token(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lowered = trimmed.to_ascii_lowercase();
    NA_TOKENS.contains(&lowered.as_str())
}

pub fn parse_bool_literal(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Looser boolean reading used when a column is cast explicitly.
pub fn parse_bool_flexible(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y"];

    let trimmed = value.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(parsed);
        }
    }
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(trimmed, fmt)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_literal_quotes_and_escapes_text() {
        assert_eq!(Value::String("A".into()).to_sql_literal(), "'A'");
        assert_eq!(
            Value::String("Rock 'n' Roll".into()).to_sql_literal(),
            "'Rock ''n'' Roll'"
        );
        assert_eq!(
            Value::String(r"C:\temp".into()).to_sql_literal(),
            r"'C:\\temp'"
        );
    }

    #[test]
    fn sql_literal_dispatches_on_type() {
        assert_eq!(Value::Integer(-5).to_sql_literal(), "-5");
        assert_eq!(Value::Float(2.5).to_sql_literal(), "2.5");
        assert_eq!(Value::Float(3.0).to_sql_literal(), "3.0");
        assert_eq!(Value::Float(f64::NAN).to_sql_literal(), "NULL");
        assert_eq!(Value::Boolean(true).to_sql_literal(), "TRUE");
        assert_eq!(Value::Null.to_sql_literal(), "NULL");

        let ts = parse_timestamp("2023-07-14 09:30:00").unwrap();
        assert_eq!(
            Value::Timestamp(ts).to_sql_literal(),
            "'2023-07-14 09:30:00'"
        );
    }

    #[test]
    fn timestamp_literal_keeps_fractional_seconds() {
        let half = parse_timestamp("2024-01-01 10:00:00.500").unwrap();
        let three_quarters = parse_timestamp("2024-01-01 10:00:00.750").unwrap();
        assert_eq!(
            Value::Timestamp(half).to_sql_literal(),
            "'2024-01-01 10:00:00.500'"
        );
        assert_ne!(
            Value::Timestamp(half).to_sql_literal(),
            Value::Timestamp(three_quarters).to_sql_literal()
        );
    }

    #[test]
    fn infinite_floats_count_as_missing() {
        assert!(Value::Null.is_missing());
        assert!(Value::Float(f64::INFINITY).is_missing());
        assert!(Value::Float(f64::NEG_INFINITY).is_missing());
        assert!(!Value::Float(1.5).is_missing());
        assert!(!Value::String("inf".into()).is_missing());
    }

    #[test]
    fn na_tokens_are_case_insensitive() {
        assert!(is_na_token(""));
        assert!(is_na_token("  "));
        assert!(is_na_token("NaN"));
        assert!(is_na_token("N/A"));
        assert!(is_na_token("<NA>"));
        assert!(!is_na_token("nana"));
        assert!(!is_na_token("0"));
    }

    #[test]
    fn parse_timestamp_accepts_dates_and_datetimes() {
        let midnight = parse_timestamp("2024-05-06").unwrap();
        assert_eq!(midnight.to_string(), "2024-05-06 00:00:00");
        let precise = parse_timestamp("2024-05-06T14:30:00").unwrap();
        assert_eq!(precise.to_string(), "2024-05-06 14:30:00");
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn flexible_booleans_accept_numeric_flags() {
        assert_eq!(parse_bool_flexible("Yes"), Some(true));
        assert_eq!(parse_bool_flexible("0"), Some(false));
        assert_eq!(parse_bool_literal("0"), None);
        assert_eq!(parse_bool_literal("FALSE"), Some(false));
    }
}
