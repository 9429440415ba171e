//! Typed, range-oriented access to spreadsheet rows.
//!
//! A [`Spreadsheet`] wraps a [`GridStore`] and hands out [`Range`]s named by
//! expressions such as `Sheet1!A1:D10`. The first row of a range is its
//! header; data rows follow until the first blank row. A range can be
//! iterated, mapped (transform rows, then write the changed ones back in one
//! batch) or reduced, decoding rows as plain [`RowView`]s, as
//! schema-validated [`TypedRow`]s, or as any serde type via a [`RowSchema`].
//!
//! ```
//! use rowport::{Spreadsheet, MemoryStore};
//!
//! let store = MemoryStore::new().with_sheet(
//!     "Scores",
//!     vec![
//!         vec!["name".into(), "score".into()],
//!         vec!["Alice".into(), "95".into()],
//!         vec!["Bob".into(), "87".into()],
//!     ],
//! );
//! let sheet = Spreadsheet::new(store);
//! let total = sheet
//!     .range("Scores!A:B")
//!     .reduce(0.0, |acc, row| acc + row.get("score").unwrap().parse::<f64>().unwrap())
//!     .unwrap();
//! assert_eq!(total, 182.0);
//! ```

pub mod codec;
pub mod cursor;
mod error;
pub mod planner;
mod range;
pub mod reduce;
mod spreadsheet;

pub use codec::{
    DictCodec, RecordCodec, RowDecoder, RowEncoder, RowView, SchemaCodec, TypedRow, split_header,
};
pub use cursor::RangeCursor;
pub use error::{CallbackError, RangeError};
pub use planner::{MapReport, UpdatePlan};
pub use range::Range;
pub use spreadsheet::Spreadsheet;

// Re-export for convenience
pub use rowport_common::{RangeExpr, row_address};
pub use rowport_schema::{Constraints, FieldSpec, FieldValue, RowSchema, ValueType};
#[cfg(feature = "csv")]
pub use rowport_store::{CsvStore, CsvStoreOptions};
pub use rowport_store::{
    GridStore, MemoryStore, RawGrid, RetryConfig, RetryStore, StoreError, UpdateInstruction,
    WorksheetRef,
};
