use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use crate::backends::memory::MemoryStore;
use crate::error::StoreError;
use crate::traits::{GridStore, RawGrid, UpdateInstruction, WorksheetRef};

#[derive(Clone, Debug)]
pub struct CsvStoreOptions {
    /// Field delimiter as a single byte. Use `b'\t'` for TSV.
    pub delimiter: u8,
    /// Title the single worksheet is exposed under.
    pub sheet_name: String,
    /// Trim surrounding whitespace from every field on load.
    pub trim: bool,
}

impl Default for CsvStoreOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            sheet_name: "Sheet1".to_string(),
            trim: false,
        }
    }
}

/// CSV-backed grid store.
///
/// Semantics:
/// - A CSV file is a single-worksheet store (default title: `Sheet1`).
/// - Every field is text; UTF-8 only.
/// - When opened from a path, each successful write or clear rewrites the file.
pub struct CsvStore {
    grid: MemoryStore,
    path: Option<PathBuf>,
    options: CsvStoreOptions,
}

impl CsvStore {
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::open_path_with_options(path, CsvStoreOptions::default())
    }

    pub fn open_path_with_options<P: AsRef<Path>>(
        path: P,
        options: CsvStoreOptions,
    ) -> Result<Self, StoreError> {
        let file = File::open(path.as_ref())?;
        let mut store = Self::from_reader(BufReader::new(file), options)?;
        store.path = Some(path.as_ref().to_path_buf());
        Ok(store)
    }

    pub fn from_bytes(bytes: &[u8], options: CsvStoreOptions) -> Result<Self, StoreError> {
        Self::from_reader(bytes, options)
    }

    pub fn from_reader<R: Read>(reader: R, options: CsvStoreOptions) -> Result<Self, StoreError> {
        let rows = read_records(reader, &options)?;
        let grid = MemoryStore::new();
        grid.set_sheet(options.sheet_name.clone(), rows);
        Ok(Self {
            grid,
            path: None,
            options,
        })
    }

    pub fn options(&self) -> &CsvStoreOptions {
        &self.options
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current contents, one entry per CSV record.
    pub fn rows(&self) -> RawGrid {
        self.grid.rows(&self.options.sheet_name).unwrap_or_default()
    }

    /// Serialize the current contents as CSV.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), StoreError> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(self.options.delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .flexible(true)
            .from_writer(writer);
        for row in self.rows() {
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        let file = File::create(path)?;
        self.write_to(file)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), "csv store persisted");
        Ok(())
    }
}

fn read_records<R: Read>(reader: R, options: &CsvStoreOptions) -> Result<RawGrid, StoreError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        // Allow ragged rows; short records stay short.
        .flexible(true)
        .trim(if options.trim {
            csv::Trim::All
        } else {
            csv::Trim::None
        })
        .from_reader(reader);
    let mut rows = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        rows.push(rec.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

impl GridStore for CsvStore {
    fn list_worksheets(&self) -> Result<Vec<WorksheetRef>, StoreError> {
        self.grid.list_worksheets()
    }

    fn worksheet_by_name(&self, name: &str) -> Result<WorksheetRef, StoreError> {
        self.grid.worksheet_by_name(name)
    }

    fn read_cells(&self, worksheet: &WorksheetRef, span: &str) -> Result<RawGrid, StoreError> {
        self.grid.read_cells(worksheet, span)
    }

    fn batch_write(
        &self,
        worksheet: &WorksheetRef,
        updates: &[UpdateInstruction],
    ) -> Result<(), StoreError> {
        self.grid.batch_write(worksheet, updates)?;
        self.persist()
    }

    fn clear(&self, worksheet: &WorksheetRef) -> Result<(), StoreError> {
        self.grid.clear(worksheet)?;
        self.persist()
    }
}
