use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::address::AddressError;
use crate::coord::{COL_MAX, column_to_letters};

/// Sheet-qualified range expression such as `Sheet1!A1:D10` or `A:D`.
///
/// Parsing never fails: the span is passed through to the grid store without
/// validation, so malformed spans surface as store errors.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RangeExpr {
    sheet: Option<String>,
    span: String,
}

fn is_quote(ch: char) -> bool {
    ch == '\'' || ch == '"'
}

impl RangeExpr {
    /// Split at the first `!`. The sheet part loses surrounding quote characters.
    pub fn parse(expr: &str) -> Self {
        match expr.split_once('!') {
            Some((sheet, span)) => RangeExpr {
                sheet: Some(sheet.trim_matches(is_quote).to_string()),
                span: span.to_string(),
            },
            None => RangeExpr {
                sheet: None,
                span: expr.to_string(),
            },
        }
    }

    pub fn new(sheet: Option<String>, span: impl Into<String>) -> Self {
        RangeExpr {
            sheet,
            span: span.into(),
        }
    }

    /// Sheet name, if the expression was sheet-qualified.
    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    /// Cell span exactly as supplied.
    pub fn span(&self) -> &str {
        &self.span
    }
}

impl FromStr for RangeExpr {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RangeExpr::parse(s))
    }
}

impl From<&str> for RangeExpr {
    fn from(value: &str) -> Self {
        RangeExpr::parse(value)
    }
}

impl From<String> for RangeExpr {
    fn from(value: String) -> Self {
        RangeExpr::parse(&value)
    }
}

impl fmt::Display for RangeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sheet {
            Some(sheet) if sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
                write!(f, "{sheet}!{}", self.span)
            }
            Some(sheet) => write!(f, "'{sheet}'!{}", self.span),
            None => f.write_str(&self.span),
        }
    }
}

/// Single-row absolute address starting at column A, e.g. `A2:C2`.
pub fn row_address(row: u32, num_columns: usize) -> Result<String, AddressError> {
    if row == 0 || num_columns == 0 {
        return Err(AddressError::ZeroIndex);
    }
    let last = u32::try_from(num_columns)
        .ok()
        .filter(|col| *col <= COL_MAX)
        .ok_or(AddressError::ColumnOverflow(
            num_columns.min(u32::MAX as usize) as u32,
        ))?;
    let letters = column_to_letters(last).ok_or(AddressError::ZeroIndex)?;
    Ok(format!("A{row}:{letters}{row}"))
}
