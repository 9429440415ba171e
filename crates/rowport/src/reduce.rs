use std::convert::Infallible;

use crate::codec::RowDecoder;
use crate::cursor::RangeCursor;
use crate::error::{CallbackError, RangeError};

/// Fold the rows of a cursor in sheet order, starting from `initial`.
///
/// A range with no data rows returns `initial` untouched. The first decode
/// error aborts the fold.
pub fn reduce<D, A, F>(cursor: RangeCursor<D>, initial: A, mut combine: F) -> Result<A, RangeError>
where
    D: RowDecoder,
    F: FnMut(A, D::Item) -> A,
{
    try_reduce(cursor, initial, |acc, item| Ok::<_, Infallible>(combine(acc, item)))
}

/// Like [`reduce`], for combine steps that can fail.
pub fn try_reduce<D, A, F, E>(
    cursor: RangeCursor<D>,
    initial: A,
    mut combine: F,
) -> Result<A, RangeError>
where
    D: RowDecoder,
    F: FnMut(A, D::Item) -> Result<A, E>,
    E: Into<CallbackError>,
{
    let mut acc = initial;
    for item in cursor {
        acc = combine(acc, item?).map_err(RangeError::callback)?;
    }
    Ok(acc)
}
