use std::error::Error;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

use crate::schema::ValueType;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATETIME_FORMAT_T: &str = "%Y-%m-%dT%H:%M:%S";

/// Decoded field value.
///
/// `Display` renders the canonical cell text the value is written back as:
/// numbers in shortest decimal form (`95`, `19.99`), booleans as `TRUE` /
/// `FALSE`, dates as `YYYY-MM-DD`, datetimes as `YYYY-MM-DD HH:MM:SS`, and
/// `Empty` as the empty string.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Int(i64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Empty,
}

/// A cell or JSON value could not be coerced to the declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoerceError {
    pub expected: ValueType,
    pub found: String,
}

impl CoerceError {
    fn new(expected: ValueType, found: impl Into<String>) -> Self {
        Self {
            expected,
            found: found.into(),
        }
    }
}

impl fmt::Display for CoerceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, found `{}`", self.expected, self.found)
    }
}

impl Error for CoerceError {}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

impl FieldValue {
    /// Coerce non-empty cell text to `value_type`.
    ///
    /// Text is taken verbatim; every other type is parsed from the trimmed
    /// cell. Callers treat the empty string as "no value" before reaching here.
    pub fn parse(value_type: ValueType, raw: &str) -> Result<Self, CoerceError> {
        let trimmed = raw.trim();
        let fail = || CoerceError::new(value_type, raw);
        match value_type {
            ValueType::String => Ok(FieldValue::Text(raw.to_string())),
            ValueType::Number => trimmed
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(FieldValue::Number)
                .ok_or_else(fail),
            ValueType::Integer => trimmed
                .parse::<i64>()
                .map(FieldValue::Int)
                .map_err(|_| fail()),
            ValueType::Boolean => parse_bool(trimmed)
                .map(FieldValue::Boolean)
                .ok_or_else(fail),
            ValueType::Date => NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .map(FieldValue::Date)
                .map_err(|_| fail()),
            ValueType::Datetime => NaiveDateTime::parse_from_str(trimmed, DATETIME_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(trimmed, DATETIME_FORMAT_T))
                .map(FieldValue::DateTime)
                .map_err(|_| fail()),
        }
    }

    /// Coerce a JSON value (a schema default or a serialized record field).
    ///
    /// `null` maps to [`FieldValue::Empty`]; strings go through [`FieldValue::parse`].
    pub fn from_json(value_type: ValueType, value: &JsonValue) -> Result<Self, CoerceError> {
        let fail = || CoerceError::new(value_type, value.to_string());
        match (value_type, value) {
            (_, JsonValue::Null) => Ok(FieldValue::Empty),
            (_, JsonValue::Array(_)) | (_, JsonValue::Object(_)) => Err(fail()),
            (ValueType::String, JsonValue::String(s)) => Ok(FieldValue::Text(s.clone())),
            (ValueType::String, JsonValue::Number(n)) => Ok(FieldValue::Text(n.to_string())),
            (ValueType::String, JsonValue::Bool(b)) => Ok(FieldValue::Text(b.to_string())),
            (ValueType::Number, JsonValue::Number(n)) => {
                n.as_f64().map(FieldValue::Number).ok_or_else(fail)
            }
            (ValueType::Integer, JsonValue::Number(n)) => n
                .as_i64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                        .map(|f| f as i64)
                })
                .map(FieldValue::Int)
                .ok_or_else(fail),
            (ValueType::Boolean, JsonValue::Bool(b)) => Ok(FieldValue::Boolean(*b)),
            (_, JsonValue::String(s)) => FieldValue::parse(value_type, s),
            _ => Err(fail()),
        }
    }

    /// JSON form used when building serde records.
    pub fn to_json(&self) -> JsonValue {
        match self {
            FieldValue::Text(s) => JsonValue::String(s.clone()),
            FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            FieldValue::Int(i) => JsonValue::from(*i),
            FieldValue::Boolean(b) => JsonValue::Bool(*b),
            FieldValue::Date(_) | FieldValue::DateTime(_) => JsonValue::String(self.to_string()),
            FieldValue::Empty => JsonValue::Null,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Empty)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of `Number` and `Int` values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Boolean(true) => f.write_str("TRUE"),
            FieldValue::Boolean(false) => f.write_str("FALSE"),
            FieldValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            FieldValue::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            FieldValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}
