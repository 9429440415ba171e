use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Rows of cell text as returned by a store, header row first.
///
/// Rows may be ragged: stores drop trailing blank cells, so a cell absent
/// from a short row is missing rather than an explicit empty string.
pub type RawGrid = Vec<Vec<String>>;

/// Handle to one worksheet of a store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorksheetRef {
    /// Store-assigned identifier, stable across renames.
    pub id: u32,
    pub title: String,
}

impl WorksheetRef {
    pub fn new(id: u32, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// One row of values destined for a single-row address such as `A2:C2`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateInstruction {
    pub address: String,
    pub values: RawGrid,
}

impl UpdateInstruction {
    pub fn new(address: impl Into<String>, row: Vec<String>) -> Self {
        Self {
            address: address.into(),
            values: vec![row],
        }
    }
}

/// The remote grid store as seen by rowport.
///
/// Every method takes `&self` so a store can be shared between ranges;
/// implementations needing mutation use interior locking.
pub trait GridStore {
    /// Worksheets in display order.
    fn list_worksheets(&self) -> Result<Vec<WorksheetRef>, StoreError>;

    fn worksheet_by_name(&self, name: &str) -> Result<WorksheetRef, StoreError>;

    /// Read the cells covered by `span`. Trailing blank cells and rows are
    /// omitted; a span past the data yields no rows.
    fn read_cells(&self, worksheet: &WorksheetRef, span: &str) -> Result<RawGrid, StoreError>;

    /// Apply all updates as one request. Either every update lands or none do.
    fn batch_write(
        &self,
        worksheet: &WorksheetRef,
        updates: &[UpdateInstruction],
    ) -> Result<(), StoreError>;

    /// Remove every cell of the worksheet.
    fn clear(&self, worksheet: &WorksheetRef) -> Result<(), StoreError>;
}

impl<S: GridStore + ?Sized> GridStore for &S {
    fn list_worksheets(&self) -> Result<Vec<WorksheetRef>, StoreError> {
        (**self).list_worksheets()
    }

    fn worksheet_by_name(&self, name: &str) -> Result<WorksheetRef, StoreError> {
        (**self).worksheet_by_name(name)
    }

    fn read_cells(&self, worksheet: &WorksheetRef, span: &str) -> Result<RawGrid, StoreError> {
        (**self).read_cells(worksheet, span)
    }

    fn batch_write(
        &self,
        worksheet: &WorksheetRef,
        updates: &[UpdateInstruction],
    ) -> Result<(), StoreError> {
        (**self).batch_write(worksheet, updates)
    }

    fn clear(&self, worksheet: &WorksheetRef) -> Result<(), StoreError> {
        (**self).clear(worksheet)
    }
}

impl<S: GridStore + ?Sized> GridStore for Arc<S> {
    fn list_worksheets(&self) -> Result<Vec<WorksheetRef>, StoreError> {
        (**self).list_worksheets()
    }

    fn worksheet_by_name(&self, name: &str) -> Result<WorksheetRef, StoreError> {
        (**self).worksheet_by_name(name)
    }

    fn read_cells(&self, worksheet: &WorksheetRef, span: &str) -> Result<RawGrid, StoreError> {
        (**self).read_cells(worksheet, span)
    }

    fn batch_write(
        &self,
        worksheet: &WorksheetRef,
        updates: &[UpdateInstruction],
    ) -> Result<(), StoreError> {
        (**self).batch_write(worksheet, updates)
    }

    fn clear(&self, worksheet: &WorksheetRef) -> Result<(), StoreError> {
        (**self).clear(worksheet)
    }
}
