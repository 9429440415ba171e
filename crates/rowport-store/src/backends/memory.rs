use parking_lot::RwLock;
use rowport_common::CellSpan;
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::traits::{GridStore, RawGrid, UpdateInstruction, WorksheetRef};

const BACKEND: &str = "memory";

#[cfg(feature = "json")]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    sheets: Vec<SheetSnapshot>,
}

#[cfg(feature = "json")]
#[derive(Clone, Debug, Serialize, Deserialize)]
struct SheetSnapshot {
    name: String,
    #[serde(default)]
    rows: RawGrid,
}

#[derive(Clone, Debug)]
struct MemorySheet {
    id: u32,
    title: String,
    rows: RawGrid,
}

impl MemorySheet {
    fn handle(&self) -> WorksheetRef {
        WorksheetRef::new(self.id, self.title.clone())
    }
}

#[derive(Debug, Default)]
struct Inner {
    sheets: Vec<MemorySheet>,
    next_id: u32,
}

impl Inner {
    fn sheet(&self, worksheet: &WorksheetRef) -> Result<&MemorySheet, StoreError> {
        self.sheets
            .iter()
            .find(|s| s.id == worksheet.id)
            .ok_or_else(|| StoreError::WorksheetNotFound(worksheet.title.clone()))
    }

    fn sheet_mut(&mut self, worksheet: &WorksheetRef) -> Result<&mut MemorySheet, StoreError> {
        self.sheets
            .iter_mut()
            .find(|s| s.id == worksheet.id)
            .ok_or_else(|| StoreError::WorksheetNotFound(worksheet.title.clone()))
    }

    fn push(&mut self, title: String, rows: RawGrid) -> WorksheetRef {
        let sheet = MemorySheet {
            id: self.next_id,
            title,
            rows,
        };
        self.next_id += 1;
        let handle = sheet.handle();
        self.sheets.push(sheet);
        handle
    }
}

/// In-process grid store.
///
/// Reads behave like the remote service: trailing blank cells of each row
/// and trailing blank rows are dropped, and a span entirely below the data
/// returns no rows. Writes are validated in full before any cell changes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemoryStore::set_sheet`].
    pub fn with_sheet(self, title: impl Into<String>, rows: RawGrid) -> Self {
        self.set_sheet(title, rows);
        self
    }

    /// Add an empty worksheet. Titles must be unique.
    pub fn add_sheet(&self, title: impl Into<String>) -> Result<WorksheetRef, StoreError> {
        let title = title.into();
        let mut inner = self.inner.write();
        if inner.sheets.iter().any(|s| s.title == title) {
            return Err(StoreError::from_backend(
                BACKEND,
                format!("worksheet already exists: {title}"),
            ));
        }
        Ok(inner.push(title, Vec::new()))
    }

    /// Replace the contents of `title`, creating the worksheet when absent.
    pub fn set_sheet(&self, title: impl Into<String>, rows: RawGrid) -> WorksheetRef {
        let title = title.into();
        let mut inner = self.inner.write();
        if let Some(sheet) = inner.sheets.iter_mut().find(|s| s.title == title) {
            sheet.rows = rows;
            return sheet.handle();
        }
        inner.push(title, rows)
    }

    /// Copy of the stored rows, untrimmed.
    pub fn rows(&self, title: &str) -> Option<RawGrid> {
        self.inner
            .read()
            .sheets
            .iter()
            .find(|s| s.title == title)
            .map(|s| s.rows.clone())
    }

    /// Cell text at 1-based `(row, col)`; `None` when outside the stored rows.
    pub fn cell(&self, title: &str, row: u32, col: u32) -> Option<String> {
        let inner = self.inner.read();
        let sheet = inner.sheets.iter().find(|s| s.title == title)?;
        let r = sheet.rows.get(row.checked_sub(1)? as usize)?;
        r.get(col.checked_sub(1)? as usize).cloned()
    }
}

#[cfg(feature = "json")]
impl MemoryStore {
    /// Load a snapshot of the form `{"sheets": [{"name": .., "rows": [[..]]}]}`.
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn from_json_reader<R: std::io::Read>(reader: R) -> Result<Self, StoreError> {
        let snapshot: Snapshot = serde_json::from_reader(reader)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn open_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self, StoreError> {
        let file = std::fs::File::open(path)?;
        Self::from_json_reader(std::io::BufReader::new(file))
    }

    pub fn to_json_string(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    pub fn save_path<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), StoreError> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write();
            for sheet in snapshot.sheets {
                inner.push(sheet.name, sheet.rows);
            }
        }
        store
    }

    fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read();
        Snapshot {
            sheets: inner
                .sheets
                .iter()
                .map(|s| SheetSnapshot {
                    name: s.title.clone(),
                    rows: s.rows.clone(),
                })
                .collect(),
        }
    }
}

fn trim_trailing_blanks(cells: &mut Vec<String>) {
    while cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
}

/// Slice `span` out of `rows` the way the remote service reports it.
pub(crate) fn read_span(rows: &[Vec<String>], span: &CellSpan) -> RawGrid {
    let height = rows.len() as u32;
    if span.start_row > height {
        return Vec::new();
    }
    let first_col = (span.start_col - 1) as usize;
    let mut out: RawGrid = (span.start_row..=span.last_row(height))
        .map(|r| {
            let row = &rows[(r - 1) as usize];
            let last_col = span.last_col(row.len() as u32) as usize;
            let mut cells = if first_col < last_col {
                row[first_col..last_col].to_vec()
            } else {
                Vec::new()
            };
            trim_trailing_blanks(&mut cells);
            cells
        })
        .collect();
    while out.last().is_some_and(|r| r.is_empty()) {
        out.pop();
    }
    out
}

/// Parse every address and check the values fit before anything is written.
pub(crate) fn plan_writes(
    updates: &[UpdateInstruction],
) -> Result<Vec<(CellSpan, &RawGrid)>, StoreError> {
    updates
        .iter()
        .map(|update| {
            let span = CellSpan::parse(&update.address)
                .map_err(|err| StoreError::invalid_span(&update.address, err))?;
            let height = update.values.len() as u32;
            let width = update.values.iter().map(Vec::len).max().unwrap_or(0) as u32;
            let fits_rows = span
                .end_row
                .is_none_or(|end| height <= end - span.start_row + 1);
            let fits_cols = span
                .end_col
                .is_none_or(|end| width <= end - span.start_col + 1);
            if !(fits_rows && fits_cols) {
                return Err(StoreError::from_backend(
                    BACKEND,
                    format!(
                        "{height}x{width} values do not fit range {}",
                        update.address
                    ),
                ));
            }
            Ok((span, &update.values))
        })
        .collect()
}

pub(crate) fn apply_writes(rows: &mut RawGrid, writes: &[(CellSpan, &RawGrid)]) {
    for (span, values) in writes {
        for (i, value_row) in values.iter().enumerate() {
            let r = (span.start_row - 1) as usize + i;
            if rows.len() <= r {
                rows.resize_with(r + 1, Vec::new);
            }
            let row = &mut rows[r];
            for (j, value) in value_row.iter().enumerate() {
                let c = (span.start_col - 1) as usize + j;
                if row.len() <= c {
                    row.resize(c + 1, String::new());
                }
                row[c] = value.clone();
            }
        }
    }
}

impl GridStore for MemoryStore {
    fn list_worksheets(&self) -> Result<Vec<WorksheetRef>, StoreError> {
        Ok(self.inner.read().sheets.iter().map(MemorySheet::handle).collect())
    }

    fn worksheet_by_name(&self, name: &str) -> Result<WorksheetRef, StoreError> {
        self.inner
            .read()
            .sheets
            .iter()
            .find(|s| s.title == name)
            .map(MemorySheet::handle)
            .ok_or_else(|| StoreError::WorksheetNotFound(name.to_string()))
    }

    fn read_cells(&self, worksheet: &WorksheetRef, span: &str) -> Result<RawGrid, StoreError> {
        let parsed = CellSpan::parse(span).map_err(|err| StoreError::invalid_span(span, err))?;
        let inner = self.inner.read();
        let sheet = inner.sheet(worksheet)?;
        Ok(read_span(&sheet.rows, &parsed))
    }

    fn batch_write(
        &self,
        worksheet: &WorksheetRef,
        updates: &[UpdateInstruction],
    ) -> Result<(), StoreError> {
        let writes = plan_writes(updates)?;
        let mut inner = self.inner.write();
        let sheet = inner.sheet_mut(worksheet)?;
        apply_writes(&mut sheet.rows, &writes);
        Ok(())
    }

    fn clear(&self, worksheet: &WorksheetRef) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        inner.sheet_mut(worksheet)?.rows.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> RawGrid {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn read_trims_trailing_cells_and_rows() {
        let rows = grid(&[
            &["name", "score", ""],
            &["Alice", "", ""],
            &[],
            &["Bob", "7"],
            &["", ""],
        ]);
        let span = CellSpan::parse("A1:C10").unwrap();
        assert_eq!(
            read_span(&rows, &span),
            grid(&[&["name", "score"], &["Alice"], &[], &["Bob", "7"]])
        );
    }

    #[test]
    fn read_honours_column_offsets() {
        let rows = grid(&[&["a", "b", "c", "d"], &["1", "2", "3", "4"], &["x"]]);
        let span = CellSpan::parse("B1:C").unwrap();
        assert_eq!(read_span(&rows, &span), grid(&[&["b", "c"], &["2", "3"]]));
    }

    #[test]
    fn span_below_data_is_empty() {
        let rows = grid(&[&["a"], &["1"]]);
        let span = CellSpan::parse("A5:D9").unwrap();
        assert!(read_span(&rows, &span).is_empty());
    }

    #[test]
    fn writes_grow_the_grid() {
        let mut rows = grid(&[&["a", "b"]]);
        let updates = vec![UpdateInstruction::new("A3:C3", vec!["1".into(), "2".into(), "3".into()])];
        let writes = plan_writes(&updates).unwrap();
        apply_writes(&mut rows, &writes);
        assert_eq!(rows, grid(&[&["a", "b"], &[], &["1", "2", "3"]]));
    }

    #[test]
    fn oversized_values_are_rejected() {
        let updates = vec![UpdateInstruction::new("A2:B2", vec!["1".into(), "2".into(), "3".into()])];
        assert!(matches!(
            plan_writes(&updates),
            Err(StoreError::Backend { .. })
        ));
    }
}
