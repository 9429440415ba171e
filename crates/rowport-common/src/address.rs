//! Cell-span grammar used by concrete grid stores.
//!
//! The range layer never validates spans; it hands them to the store as-is.
//! Stores that need to interpret a span (the in-memory and CSV stores) use
//! [`CellSpan::parse`], which accepts the same shapes the remote service does:
//!
//! - bounded rectangles: `A1:D10`, `$A$1:$D$10`
//! - unbounded column spans: `A:D`, `A2:D`
//! - row spans: `2:5`
//! - single cells or columns: `B3`, `C`

use std::error::Error;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::coord::{COL_MAX, column_to_letters, letters_to_column};

static ENDPOINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$?([A-Z]*)\$?([0-9]*)$").expect("endpoint regex must compile"));

/// Errors produced while parsing spans or forming row addresses.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AddressError {
    /// The span text does not follow A1 notation.
    InvalidSpan(String),
    /// Encountered a 0 where a 1-based row or column was required.
    ZeroIndex,
    /// Column index beyond the largest supported column.
    ColumnOverflow(u32),
    /// Start/end endpoints were not ordered (start <= end).
    RangeOrder,
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressError::InvalidSpan(span) => write!(f, "invalid cell span `{span}`"),
            AddressError::ZeroIndex => {
                write!(f, "row and column indices must be 1-based (>= 1)")
            }
            AddressError::ColumnOverflow(col) => {
                write!(f, "column {col} exceeds the last supported column {COL_MAX}")
            }
            AddressError::RangeOrder => {
                write!(
                    f,
                    "span must be ordered so the start is above/left of the end"
                )
            }
        }
    }
}

impl Error for AddressError {}

/// Parsed cell span with 1-based, inclusive bounds.
///
/// `end_row` / `end_col` are `None` for open-ended spans (`A:D` has no end
/// row, `2:5` has no end column).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct CellSpan {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: Option<u32>,
    pub end_col: Option<u32>,
}

#[derive(Clone, Copy, Debug)]
struct Endpoint {
    row: Option<u32>,
    col: Option<u32>,
}

fn parse_endpoint(raw: &str, span: &str) -> Result<Endpoint, AddressError> {
    let upper = raw.trim().to_ascii_uppercase();
    let caps = ENDPOINT
        .captures(&upper)
        .ok_or_else(|| AddressError::InvalidSpan(span.to_string()))?;
    let letters = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let digits = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    if letters.is_empty() && digits.is_empty() {
        return Err(AddressError::InvalidSpan(span.to_string()));
    }

    let col = if letters.is_empty() {
        None
    } else {
        let col = letters_to_column(letters)
            .ok_or_else(|| AddressError::InvalidSpan(span.to_string()))?;
        if col > COL_MAX {
            return Err(AddressError::ColumnOverflow(col));
        }
        Some(col)
    };
    let row = if digits.is_empty() {
        None
    } else {
        let row: u32 = digits
            .parse()
            .map_err(|_| AddressError::InvalidSpan(span.to_string()))?;
        if row == 0 {
            return Err(AddressError::ZeroIndex);
        }
        Some(row)
    };
    Ok(Endpoint { row, col })
}

impl CellSpan {
    /// Parse an A1-style span (without sheet prefix).
    pub fn parse(span: &str) -> Result<Self, AddressError> {
        let (start, end) = match span.split_once(':') {
            Some((start, end)) => {
                let start = parse_endpoint(start, span)?;
                let end = parse_endpoint(end, span)?;
                (start, end)
            }
            None => {
                let single = parse_endpoint(span, span)?;
                (single, single)
            }
        };

        let parsed = CellSpan {
            start_row: start.row.unwrap_or(1),
            start_col: start.col.unwrap_or(1),
            end_row: end.row,
            end_col: end.col,
        };
        if let Some(end_row) = parsed.end_row
            && end_row < parsed.start_row
        {
            return Err(AddressError::RangeOrder);
        }
        if let Some(end_col) = parsed.end_col
            && end_col < parsed.start_col
        {
            return Err(AddressError::RangeOrder);
        }
        Ok(parsed)
    }

    /// Whether the (1-based) cell falls inside the span.
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.start_row
            && col >= self.start_col
            && self.end_row.is_none_or(|end| row <= end)
            && self.end_col.is_none_or(|end| col <= end)
    }

    /// Last row covered, clamped to `limit` for open-ended spans.
    pub fn last_row(&self, limit: u32) -> u32 {
        self.end_row.map_or(limit, |end| end.min(limit))
    }

    /// Last column covered, clamped to `limit` for open-ended spans.
    pub fn last_col(&self, limit: u32) -> u32 {
        self.end_col.map_or(limit, |end| end.min(limit))
    }
}

impl fmt::Display for CellSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start_col = column_to_letters(self.start_col).unwrap_or_default();
        write!(f, "{start_col}{}:", self.start_row)?;
        if let Some(end_col) = self.end_col {
            write!(f, "{}", column_to_letters(end_col).unwrap_or_default())?;
        }
        if let Some(end_row) = self.end_row {
            write!(f, "{end_row}")?;
        }
        Ok(())
    }
}
