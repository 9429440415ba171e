use std::convert::Infallible;

use rowport_common::row_address;
use rowport_store::{GridStore, UpdateInstruction, WorksheetRef};

use crate::codec::RowEncoder;
use crate::cursor::RangeCursor;
use crate::error::{CallbackError, RangeError};

/// Write-back plan produced by walking a range once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdatePlan {
    pub instructions: Vec<UpdateInstruction>,
    /// Data rows decoded before the walk ended.
    pub rows_scanned: usize,
}

/// Outcome of a map over a range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MapReport {
    pub rows_scanned: usize,
    pub rows_updated: usize,
}

/// Run `transform` over every row; `None` leaves the row untouched.
///
/// Each replacement is encoded against the original header and addressed as
/// the single sheet row `A{n}:{last}{n}`, where `n` counts from row 2 in
/// traversal order.
pub fn plan<C, F>(cursor: RangeCursor<C>, mut transform: F) -> Result<UpdatePlan, RangeError>
where
    C: RowEncoder,
    F: FnMut(C::Item) -> Option<C::Item>,
{
    try_plan(cursor, |item| Ok::<_, Infallible>(transform(item)))
}

/// Like [`plan`], for transforms that can fail. A failure aborts the plan.
pub fn try_plan<C, F, E>(mut cursor: RangeCursor<C>, mut transform: F) -> Result<UpdatePlan, RangeError>
where
    C: RowEncoder,
    F: FnMut(C::Item) -> Result<Option<C::Item>, E>,
    E: Into<CallbackError>,
{
    let mut plan = UpdatePlan::default();
    loop {
        let row_number = cursor.next_row_number();
        let Some(item) = cursor.next() else {
            break;
        };
        plan.rows_scanned += 1;
        let Some(updated) = transform(item?).map_err(RangeError::callback)? else {
            continue;
        };
        let header = cursor.header();
        let values = cursor.decoder().encode(&updated, header, row_number)?;
        let address = row_address(row_number, header.len())?;
        plan.instructions.push(UpdateInstruction::new(address, values));
    }
    Ok(plan)
}

/// Send every instruction in one batch write. An empty plan makes no call.
pub fn apply<S: GridStore + ?Sized>(
    store: &S,
    worksheet: &WorksheetRef,
    instructions: &[UpdateInstruction],
) -> Result<usize, RangeError> {
    if instructions.is_empty() {
        return Ok(0);
    }
    #[cfg(feature = "tracing")]
    tracing::debug!(
        sheet = worksheet.title.as_str(),
        updates = instructions.len(),
        "batch write"
    );
    store.batch_write(worksheet, instructions)?;
    Ok(instructions.len())
}
