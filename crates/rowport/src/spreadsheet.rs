use rowport_common::RangeExpr;
use rowport_store::{GridStore, WorksheetRef};

use crate::error::RangeError;
use crate::range::Range;

/// Entry point: a grid store handle that hands out [`Range`]s.
///
/// The store is owned explicitly; pass `&store` or an `Arc` to share one
/// store between several spreadsheets.
pub struct Spreadsheet<S> {
    store: S,
}

impl<S: GridStore> Spreadsheet<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Range addressed by an expression such as `Sheet1!A1:D10` or `'My Sheet'!A:D`.
    pub fn range(&self, expr: impl Into<RangeExpr>) -> Range<'_, S> {
        Range::new(&self.store, expr)
    }

    pub fn worksheets(&self) -> Result<Vec<WorksheetRef>, RangeError> {
        Ok(self.store.list_worksheets()?)
    }

    /// Remove every cell of the named worksheet.
    pub fn clear_sheet(&self, name: &str) -> Result<(), RangeError> {
        let worksheet = self.store.worksheet_by_name(name)?;
        self.store.clear(&worksheet)?;
        Ok(())
    }
}
