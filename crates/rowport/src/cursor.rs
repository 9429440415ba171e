use std::iter::FusedIterator;

use rowport_common::RangeExpr;
use rowport_store::{GridStore, RawGrid, WorksheetRef};

use crate::codec::{RowDecoder, is_blank_row, split_header};
use crate::error::RangeError;

/// Sheet row of the first data row: the header occupies row 1.
pub const FIRST_DATA_ROW: u32 = 2;

/// Resolve the worksheet a range expression targets.
///
/// An unqualified expression targets the first worksheet.
pub fn resolve_worksheet<S: GridStore + ?Sized>(
    store: &S,
    expr: &RangeExpr,
) -> Result<WorksheetRef, RangeError> {
    match expr.sheet() {
        Some(name) => Ok(store.worksheet_by_name(name)?),
        None => store
            .list_worksheets()?
            .into_iter()
            .next()
            .ok_or(RangeError::NoWorksheets),
    }
}

/// Forward-only traversal of the data rows of one range.
///
/// All cells are fetched by [`RangeCursor::open`] in a single read. Rows are
/// then decoded lazily in sheet order. The first blank row ends the
/// traversal for good; a decode failure is yielded once and also ends it.
pub struct RangeCursor<D> {
    decoder: D,
    worksheet: WorksheetRef,
    header: Vec<String>,
    rows: std::vec::IntoIter<Vec<String>>,
    next_row: u32,
    done: bool,
}

impl<D: RowDecoder> RangeCursor<D> {
    pub fn open<S: GridStore + ?Sized>(
        store: &S,
        expr: &RangeExpr,
        decoder: D,
    ) -> Result<Self, RangeError> {
        let worksheet = resolve_worksheet(store, expr)?;
        let grid = store.read_cells(&worksheet, expr.span())?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            sheet = worksheet.title.as_str(),
            span = expr.span(),
            rows = grid.len(),
            "range fetched"
        );
        Self::from_grid(worksheet, expr.span(), grid, decoder)
    }

    /// Build a cursor over an already fetched grid (header row first).
    pub fn from_grid(
        worksheet: WorksheetRef,
        span: &str,
        grid: RawGrid,
        decoder: D,
    ) -> Result<Self, RangeError> {
        split_header(&grid, span)?;
        let mut rows = grid.into_iter();
        let header = rows.next().unwrap_or_default();
        Ok(Self {
            decoder,
            worksheet,
            header,
            rows,
            next_row: FIRST_DATA_ROW,
            done: false,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn worksheet(&self) -> &WorksheetRef {
        &self.worksheet
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Sheet row the next yielded item will come from.
    pub fn next_row_number(&self) -> u32 {
        self.next_row
    }

    /// Whether the traversal has ended.
    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl<D: RowDecoder> Iterator for RangeCursor<D> {
    type Item = Result<D::Item, RangeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let Some(row) = self.rows.next() else {
            self.done = true;
            return None;
        };
        if is_blank_row(&row) {
            #[cfg(feature = "tracing")]
            tracing::trace!(row = self.next_row, "blank row ends range");
            self.done = true;
            return None;
        }
        let row_number = self.next_row;
        self.next_row += 1;
        match self.decoder.decode(&self.header, &row, row_number) {
            Ok(item) => Some(Ok(item)),
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (0, Some(self.rows.len()))
        }
    }
}

impl<D: RowDecoder> FusedIterator for RangeCursor<D> {}
